pub mod client;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

pub use client::HttpBackend;
pub use types::{
    ChatSearchRequest, ForwardRequest, IndexChat, IndexedChats, MessageResponse,
    MultiSearchRequest, ReplyRequest, SearchHit, SearchResponse,
};

/// Raw bytes of a message attachment, as they arrive.
pub type FileStream = BoxStream<'static, Result<Bytes, ApiError>>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// The remote search backend.
///
/// Implementations carry the bearer key themselves; `set_api_key` must take
/// effect for every request issued after it returns.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn set_api_key(&self, key: Option<&str>);

    async fn indexed_chats(&self) -> Result<IndexedChats, ApiError>;

    async fn chat_index(&self, chat_id: i64) -> Result<Option<IndexChat>, ApiError>;

    async fn search_in_chat(
        &self,
        chat_id: i64,
        request: &ChatSearchRequest,
    ) -> Result<SearchResponse, ApiError>;

    async fn multi_search(&self, request: &MultiSearchRequest) -> Result<SearchResponse, ApiError>;

    async fn fetch_messages(&self, chat_id: i64, ids: &[i64]) -> Result<SearchResponse, ApiError>;

    async fn reply(&self, request: &ReplyRequest) -> Result<MessageResponse, ApiError>;

    async fn forward(&self, request: &ForwardRequest) -> Result<MessageResponse, ApiError>;

    /// Stream a message attachment. Sent without the bearer key.
    async fn open_file(&self, chat_id: i64, message_id: i64) -> Result<FileStream, ApiError>;
}
