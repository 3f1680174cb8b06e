//! Search response and page result types.
//!
//! [`SearchResponse`] is the wire shape the search API returns; the
//! orchestrator tags it with the query it answered to produce a [`PageResult`],
//! which is what the cache stores and the accumulator consumes.

use super::movie::Movie;
use serde::{Deserialize, Serialize};

/// One page of results as returned by the search API.
///
/// Fields the crate does not use (`total_results`, …) are ignored. A missing
/// `results` array decodes as an empty page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Movie>,
    pub page: u32,
    pub total_pages: u32,
}

impl SearchResponse {
    /// Tags the response with the query it answered.
    #[must_use]
    pub fn into_page(self, query: impl Into<String>) -> PageResult {
        PageResult {
            results: self.results,
            page: self.page,
            total_pages: self.total_pages,
            query: query.into(),
        }
    }
}

/// One successful fetch, tagged with its query.
///
/// Stored verbatim in the cache and never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub results: Vec<Movie>,
    pub page: u32,
    pub total_pages: u32,
    pub query: String,
}
