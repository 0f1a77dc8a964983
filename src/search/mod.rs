pub mod filter;
pub mod highlight;
pub mod pages;
pub mod request;
pub mod session;

use serde::{Deserialize, Serialize};

use crate::api::{IndexChat, IndexedChats, SearchHit, SearchResponse};

pub use filter::{ChatFilter, Query};
pub use pages::PageSpec;
pub use session::SearchSession;

/// Hits and metrics from the last applied search. Always replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub hits: Vec<SearchHit>,
    pub estimated_total: usize,
    pub processing_time_ms: f64,
    pub semantic_hit_count: usize,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty() && self.estimated_total == 0
    }
}

impl From<SearchResponse> for ResultSet {
    fn from(response: SearchResponse) -> Self {
        Self {
            hits: response.hits,
            estimated_total: response.estimated_total_hits,
            processing_time_ms: response.processing_time_ms,
            semantic_hit_count: response.semantic_hit_count,
        }
    }
}

/// Indexed chats visible to the current key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatCatalog {
    pub chats: Vec<IndexChat>,
    pub master: bool,
}

impl From<IndexedChats> for ChatCatalog {
    fn from(indexed: IndexedChats) -> Self {
        Self {
            chats: indexed.chats,
            master: indexed.master,
        }
    }
}

/// What a search call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// No API key; nothing was sent.
    NotConfigured,
    /// The response replaced the result set.
    Applied,
    /// A newer search or a filter change happened while this one was in
    /// flight, so its response was dropped.
    Superseded,
    /// Requested page outside `[1, total_pages]`; nothing was sent.
    PageOutOfRange,
}
