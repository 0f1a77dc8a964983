use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;

use super::types::{
    ChatSearchRequest, ForwardRequest, IndexChat, IndexedChats, MessageResponse,
    MultiSearchRequest, ReplyRequest, SearchHit, SearchResponse,
};
use super::{ApiError, FileStream, SearchBackend};

/// A queued answer for `multi_search`.
pub enum Reply {
    Ready(Result<SearchResponse, ApiError>),
    /// Resolves when the test sends on the paired channel.
    Held(oneshot::Receiver<Result<SearchResponse, ApiError>>),
}

/// In-memory backend that records every call.
#[derive(Default)]
pub struct FakeBackend {
    pub keys: Mutex<Vec<Option<String>>>,
    pub searches: Mutex<Vec<MultiSearchRequest>>,
    pub chat_searches: Mutex<Vec<(i64, ChatSearchRequest)>>,
    pub replies: Mutex<Vec<ReplyRequest>>,
    pub catalog_calls: Mutex<usize>,
    pub catalog: Mutex<Option<IndexedChats>>,
    search_replies: Mutex<VecDeque<Reply>>,
}

impl FakeBackend {
    pub fn with_catalog(chats: Vec<IndexChat>, master: bool) -> Self {
        let backend = Self::default();
        *backend.catalog.lock().unwrap() = Some(IndexedChats { chats, master });
        backend
    }

    pub fn push_search(&self, reply: Reply) {
        self.search_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_response(&self, response: SearchResponse) {
        self.push_search(Reply::Ready(Ok(response)));
    }

    pub fn push_error(&self, status: u16) {
        self.push_search(Reply::Ready(Err(ApiError::Status {
            status,
            body: "boom".to_string(),
        })));
    }

    /// Queue a response that only arrives once the returned sender fires.
    pub fn hold_search(&self) -> oneshot::Sender<Result<SearchResponse, ApiError>> {
        let (tx, rx) = oneshot::channel();
        self.push_search(Reply::Held(rx));
        tx
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    pub fn last_search(&self) -> Option<MultiSearchRequest> {
        self.searches.lock().unwrap().last().cloned()
    }

    pub fn catalog_call_count(&self) -> usize {
        *self.catalog_calls.lock().unwrap()
    }
}

pub fn hit(chat_id: i64, message_id: i64, text: &str) -> SearchHit {
    SearchHit {
        chat_id,
        message_id,
        text: text.to_string(),
        timestamp_secs: 1_700_000_000 + message_id,
        msg_type: "text".to_string(),
        user_id: 1,
        ..Default::default()
    }
}

pub fn response(total: usize, hits: Vec<SearchHit>) -> SearchResponse {
    SearchResponse {
        hits,
        estimated_total_hits: total,
        limit: 12,
        offset: 0,
        processing_time_ms: 3.0,
        semantic_hit_count: 1,
    }
}

pub fn chat(chat_id: i64, title: &str) -> IndexChat {
    IndexChat {
        chat_id,
        title: title.to_string(),
        ..Default::default()
    }
}

#[async_trait]
impl SearchBackend for FakeBackend {
    fn set_api_key(&self, key: Option<&str>) {
        self.keys.lock().unwrap().push(key.map(str::to_string));
    }

    async fn indexed_chats(&self) -> Result<IndexedChats, ApiError> {
        *self.catalog_calls.lock().unwrap() += 1;
        self.catalog
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::Status {
                status: 503,
                body: "catalog unavailable".to_string(),
            })
    }

    async fn chat_index(&self, chat_id: i64) -> Result<Option<IndexChat>, ApiError> {
        let catalog = self.catalog.lock().unwrap().clone().unwrap_or_default();
        Ok(catalog.chats.into_iter().find(|c| c.chat_id == chat_id))
    }

    async fn search_in_chat(
        &self,
        chat_id: i64,
        request: &ChatSearchRequest,
    ) -> Result<SearchResponse, ApiError> {
        self.chat_searches
            .lock()
            .unwrap()
            .push((chat_id, request.clone()));
        Ok(SearchResponse::default())
    }

    async fn multi_search(&self, request: &MultiSearchRequest) -> Result<SearchResponse, ApiError> {
        self.searches.lock().unwrap().push(request.clone());
        let reply = self.search_replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Held(rx)) => rx.await.unwrap_or_else(|_| {
                Err(ApiError::Status {
                    status: 499,
                    body: "held reply dropped".to_string(),
                })
            }),
            None => Ok(SearchResponse::default()),
        }
    }

    async fn fetch_messages(&self, chat_id: i64, ids: &[i64]) -> Result<SearchResponse, ApiError> {
        let hits = ids.iter().map(|id| hit(chat_id, *id, "fetched")).collect();
        Ok(response(ids.len(), hits))
    }

    async fn reply(&self, request: &ReplyRequest) -> Result<MessageResponse, ApiError> {
        self.replies.lock().unwrap().push(request.clone());
        Ok(MessageResponse {
            status: "ok".to_string(),
            message: "sent".to_string(),
        })
    }

    async fn forward(&self, _request: &ForwardRequest) -> Result<MessageResponse, ApiError> {
        Ok(MessageResponse {
            status: "ok".to_string(),
            message: "forwarded".to_string(),
        })
    }

    async fn open_file(&self, _chat_id: i64, _message_id: i64) -> Result<FileStream, ApiError> {
        use futures::StreamExt;
        let chunks = vec![Ok(bytes::Bytes::from_static(b"abc"))];
        Ok(futures::stream::iter(chunks).boxed())
    }
}
