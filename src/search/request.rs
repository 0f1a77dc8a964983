use std::collections::BTreeSet;

use super::filter::{ChatFilter, Query};
use super::pages::PageSpec;
use crate::api::{ChatSearchRequest, MultiSearchRequest};

/// Turns the session's query, filter and page into request bodies.
///
/// Every optional dimension goes through [`non_empty`], so an empty
/// selection is left out of the body instead of being sent as `[]`.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    query: &'a Query,
    filter: &'a ChatFilter,
    page: &'a PageSpec,
    all_chats: bool,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(query: &'a Query, filter: &'a ChatFilter, page: &'a PageSpec) -> Self {
        Self {
            query,
            filter,
            page,
            all_chats: false,
        }
    }

    /// Ask for every indexed chat. Replaces the chat id list.
    pub fn all_chats(mut self, enabled: bool) -> Self {
        self.all_chats = enabled;
        self
    }

    pub fn multi_chat(&self) -> MultiSearchRequest {
        let (all_chats, chat_ids) = if self.all_chats {
            (Some(true), None)
        } else {
            (None, non_empty(&self.filter.chat_ids))
        };
        MultiSearchRequest {
            query: self.query.normalized().to_string(),
            all_chats,
            chat_ids,
            limit: Some(self.page.page_size()),
            offset: Some(self.page.offset()),
            users: non_empty(&self.filter.user_ids),
            types: non_empty(&self.filter.types),
        }
    }

    /// Body for a single-chat search; the chat id travels in the path.
    pub fn single_chat(&self) -> ChatSearchRequest {
        ChatSearchRequest {
            query: self.query.normalized().to_string(),
            limit: Some(self.page.page_size()),
            offset: Some(self.page.offset()),
            users: non_empty(&self.filter.user_ids),
            types: non_empty(&self.filter.types),
        }
    }
}

fn non_empty<T: Clone>(set: &BTreeSet<T>) -> Option<Vec<T>> {
    if set.is_empty() {
        None
    } else {
        Some(set.iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_user_filter_is_sent() {
        let query = Query::new("hello");
        let filter = ChatFilter {
            user_ids: [5].into_iter().collect(),
            ..Default::default()
        };
        let page = PageSpec::new(12);
        let body = serde_json::to_value(RequestBuilder::new(&query, &filter, &page).multi_chat())
            .unwrap();

        assert_eq!(
            body,
            json!({ "query": "hello", "limit": 12, "offset": 0, "users": [5] })
        );
        assert!(body.get("chat_ids").is_none());
        assert!(body.get("types").is_none());
    }

    #[test]
    fn test_all_dimensions_and_trimming() {
        let query = Query::new("  cats  ");
        let filter = ChatFilter {
            chat_ids: [20, 10].into_iter().collect(),
            user_ids: [1].into_iter().collect(),
            types: ["photo".to_string(), "text".to_string()].into_iter().collect(),
        };
        let mut page = PageSpec::new(10);
        page.go_to(3, 100);

        let request = RequestBuilder::new(&query, &filter, &page).multi_chat();
        assert_eq!(request.query, "cats");
        assert_eq!(request.chat_ids, Some(vec![10, 20]));
        assert_eq!(request.types, Some(vec!["photo".to_string(), "text".to_string()]));
        assert_eq!(request.offset, Some(20));
        assert_eq!(request.all_chats, None);
    }

    #[test]
    fn test_all_chats_replaces_ids() {
        let query = Query::default();
        let filter = ChatFilter {
            chat_ids: [1, 2].into_iter().collect(),
            ..Default::default()
        };
        let page = PageSpec::default();
        let request = RequestBuilder::new(&query, &filter, &page)
            .all_chats(true)
            .multi_chat();
        assert_eq!(request.all_chats, Some(true));
        assert_eq!(request.chat_ids, None);
        assert_eq!(request.query, "");
    }

    #[test]
    fn test_single_chat_body() {
        let query = Query::new("x");
        let filter = ChatFilter {
            chat_ids: [1].into_iter().collect(),
            types: ["voice".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let page = PageSpec::new(5);
        let body = serde_json::to_value(RequestBuilder::new(&query, &filter, &page).single_chat())
            .unwrap();
        assert_eq!(
            body,
            json!({ "query": "x", "limit": 5, "offset": 0, "types": ["voice"] })
        );
    }
}
