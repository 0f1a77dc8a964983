use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Free-text query as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    text: String,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The text as sent to the backend. Blank queries stay legal and mean
    /// "everything".
    pub fn normalized(&self) -> &str {
        self.text.trim()
    }

    /// Whitespace-separated terms, for local highlighting.
    pub fn terms(&self) -> Vec<String> {
        self.text.split_whitespace().map(str::to_string).collect()
    }
}

/// Which chats, senders and message types a search is restricted to.
///
/// An empty set means "no restriction on that dimension".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFilter {
    pub chat_ids: BTreeSet<i64>,
    pub user_ids: BTreeSet<i64>,
    pub types: BTreeSet<String>,
}

impl ChatFilter {
    pub fn is_unrestricted(&self) -> bool {
        self.chat_ids.is_empty() && self.user_ids.is_empty() && self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_normalized() {
        assert_eq!(Query::new("  hello world \n").normalized(), "hello world");
        assert_eq!(Query::new("   ").normalized(), "");
        assert_eq!(Query::new(" a  b ").terms(), vec!["a", "b"]);
    }

    #[test]
    fn test_filter_dedupes() {
        let filter = ChatFilter {
            chat_ids: [3, 1, 3].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(filter.chat_ids.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert!(!filter.is_unrestricted());
        assert!(ChatFilter::default().is_unrestricted());
    }
}
