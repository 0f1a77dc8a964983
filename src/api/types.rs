use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Page size the backend assumes when a search response omits its payload.
pub const FALLBACK_LIMIT: usize = 10;

/// A chat source the backend has indexed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexChat {
    pub chat_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub chat_type: i32,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "public", default)]
    pub is_public: bool,
    #[serde(rename = "watching", default)]
    pub is_watching: bool,
    /// The backend refuses to drop this chat's index.
    #[serde(rename = "no_delete", default)]
    pub is_protected: bool,
}

/// One matched message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chat_id: i64,
    #[serde(rename = "id")]
    pub message_id: i64,
    #[serde(rename = "message", default)]
    pub text: String,
    /// Unix seconds.
    #[serde(rename = "timestamp", default)]
    pub timestamp_secs: i64,
    #[serde(rename = "type", default)]
    pub msg_type: String,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_full_name: Option<String>,
    #[serde(default)]
    pub full_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocred: Option<String>,
    #[serde(rename = "aigenerated", default, skip_serializing_if = "Option::is_none")]
    pub ai_generated: Option<String>,
    #[serde(default)]
    pub full_formatted_text: String,
    /// Backend-highlighted copies of some fields. Display only.
    #[serde(rename = "_formatted", default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<BTreeMap<String, serde_json::Value>>,
}

impl SearchHit {
    /// Backend markup for `field`, if it sent a string for it.
    pub fn formatted_field(&self, field: &str) -> Option<&str> {
        self.formatted.as_ref()?.get(field)?.as_str()
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp_secs, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
    #[serde(default)]
    pub estimated_total_hits: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub processing_time_ms: f64,
    #[serde(default)]
    pub semantic_hit_count: usize,
}

impl Default for SearchResponse {
    fn default() -> Self {
        Self {
            hits: Vec::new(),
            estimated_total_hits: 0,
            limit: FALLBACK_LIMIT,
            offset: 0,
            processing_time_ms: 0.0,
            semantic_hit_count: 0,
        }
    }
}

/// Body for `POST index/{chat_id}/search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatSearchRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
}

/// Body for `POST index/multi-search`.
///
/// `all_chats` is only honoured for master keys; otherwise `chat_ids` scopes
/// the search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiSearchRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_chats: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchMessagesRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyRequest {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardRequest {
    pub from_chat_id: i64,
    pub to_chat_id: i64,
    pub message_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Catalog answer from `GET indexed`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedChats {
    pub chats: Vec<IndexChat>,
    /// The current key may search across every indexed chat.
    pub master: bool,
}

/// The `{ status, <payload>, master? }` wrapper every JSON endpoint answers
/// with. The payload key is `results`, `chats` or `index` depending on the
/// endpoint and may be missing entirely.
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: String,
    #[serde(rename = "results", alias = "chats", alias = "index")]
    pub payload: Option<T>,
    pub master: Option<bool>,
}

impl<T: Fallback> Envelope<T> {
    /// The payload, or the type's fallback when the backend left it out.
    ///
    /// This is the only place a missing payload is turned into a value:
    /// an empty search response (limit 10), an empty chat list, and so on.
    pub fn into_payload(self) -> T {
        self.payload.unwrap_or_else(T::fallback)
    }
}

/// Value substituted for a payload the backend did not send.
pub trait Fallback {
    fn fallback() -> Self;
}

impl Fallback for SearchResponse {
    fn fallback() -> Self {
        SearchResponse::default()
    }
}

impl<T> Fallback for Vec<T> {
    fn fallback() -> Self {
        Vec::new()
    }
}
