//! Boundary with the remote search service.
//!
//! The orchestrator only sees the [`SearchApi`] trait. [`TmdbClient`] is the
//! HTTP implementation; [`ScriptedApi`] serves canned pages from memory for
//! offline development and tests.
//!
//! # Modules
//!
//! - `tmdb`: `reqwest`-based client for the TMDB search endpoint
//! - `scripted`: in-memory implementation with call recording

pub mod scripted;
pub mod tmdb;

pub use scripted::ScriptedApi;
pub use tmdb::TmdbClient;

use crate::domain::{Result, SearchResponse};
use async_trait::async_trait;

/// A paginated movie search service.
///
/// Implementations authenticate themselves (the HTTP client carries the bearer
/// token from [`crate::Config`]) and report failures as the network family of
/// [`crate::SearchError`]: `Network`, `Timeout` or `MalformedResponse`.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Fetches one page of results for `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent, times out, gets a
    /// non-success status, or the body is not a search response.
    async fn search_movies(&self, query: &str, page: u32) -> Result<SearchResponse>;
}
