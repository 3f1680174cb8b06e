//! The exposed search state.
//!
//! [`SearchState`] is the single source of truth the view layer renders. It is
//! owned by the fetch orchestrator and handed out as cloned snapshots; the view
//! never mutates it.
//!
//! # State Components
//!
//! - **Results**: accumulated movies for the current query
//! - **Status / error**: lifecycle of the last applied request
//! - **Cache**: every page fetched since the last cache clear
//! - **Pagination**: `current_page` / `total_pages` of the accumulated list
//! - **Query**: the query whose pages make up `results`

use super::cache::CacheStore;
use super::status::RequestStatus;
use crate::domain::Movie;
use serde::{Deserialize, Serialize};

/// Serializable snapshot of the search screen's request state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    /// Movies of every page applied for `query`, in page order.
    pub results: Vec<Movie>,

    pub status: RequestStatus,

    /// Message of the last failure; cleared by the next success or a purge.
    pub error: Option<String>,

    pub cache: CacheStore,

    /// Page number of the last applied page. `1` after a purge.
    pub current_page: u32,

    /// Total pages reported for `query`. `1` after a purge.
    pub total_pages: u32,

    /// Query of the last applied page; empty after a purge.
    #[serde(default)]
    pub query: String,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            status: RequestStatus::Idle,
            error: None,
            cache: CacheStore::new(),
            current_page: 1,
            total_pages: 1,
            query: String::new(),
        }
    }
}

impl SearchState {
    /// Creates the default state with a pre-populated cache.
    #[must_use]
    pub fn with_cache(cache: CacheStore) -> Self {
        Self {
            cache,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == RequestStatus::Loading
    }

    /// Whether a further page exists and no request is in flight.
    #[must_use]
    pub fn can_load_more(&self) -> bool {
        !self.query.is_empty() && self.current_page < self.total_pages && !self.is_loading()
    }

    /// Loading while a list is already shown; drives the list-footer spinner.
    #[must_use]
    pub fn is_loading_more(&self) -> bool {
        self.is_loading() && self.current_page > 1
    }

    /// Resets everything but the cache to defaults.
    pub(crate) fn reset_view(&mut self) {
        self.results.clear();
        self.status = RequestStatus::Idle;
        self.error = None;
        self.current_page = 1;
        self.total_pages = 1;
        self.query.clear();
    }
}
