//! In-memory search service with canned responses.
//!
//! Useful for running the search core without network access and for
//! exercising the orchestrator in tests. Every call is recorded, so callers can
//! assert exactly which `(query, page)` pairs reached the "network".

use super::SearchApi;
use crate::domain::{Movie, Result, SearchError, SearchResponse};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Page(SearchResponse),
    Failure(String),
}

#[derive(Debug, Clone)]
struct Script {
    reply: Reply,
    delay: Duration,
}

/// Serves scripted pages keyed by `(query, page)`.
///
/// Unscripted requests fail with a network error, the way an unreachable
/// server would.
///
/// # Examples
///
/// ```
/// use reelsearch::api::{ScriptedApi, SearchApi};
/// use reelsearch::Movie;
///
/// # tokio_test_block_on(async {
/// let api = ScriptedApi::new()
///     .with_page("alien", 1, 2, vec![Movie::new(348, "Alien", "1979-05-25", None)]);
///
/// let page = api.search_movies("alien", 1).await.unwrap();
/// assert_eq!(page.total_pages, 2);
/// assert_eq!(api.call_count(), 1);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ScriptedApi {
    scripts: Mutex<HashMap<(String, u32), Script>>,
    calls: Mutex<Vec<(String, u32)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful page.
    #[must_use]
    pub fn with_page(self, query: &str, page: u32, total_pages: u32, movies: Vec<Movie>) -> Self {
        self.script(
            query,
            page,
            Reply::Page(SearchResponse {
                results: movies,
                page,
                total_pages,
            }),
        );
        self
    }

    /// Scripts a failure whose message ends up in `SearchState::error`.
    #[must_use]
    pub fn with_failure(self, query: &str, page: u32, message: &str) -> Self {
        self.script(query, page, Reply::Failure(message.to_string()));
        self
    }

    /// Delays the reply for an already scripted request.
    #[must_use]
    pub fn with_delay(self, query: &str, page: u32, delay: Duration) -> Self {
        if let Some(script) = lock(&self.scripts).get_mut(&(query.to_string(), page)) {
            script.delay = delay;
        }
        self
    }

    /// Scripts (or re-scripts) a page after construction.
    pub fn set_page(&self, query: &str, page: u32, total_pages: u32, movies: Vec<Movie>) {
        self.script(
            query,
            page,
            Reply::Page(SearchResponse {
                results: movies,
                page,
                total_pages,
            }),
        );
    }

    fn script(&self, query: &str, page: u32, reply: Reply) {
        lock(&self.scripts).insert(
            (query.to_string(), page),
            Script {
                reply,
                delay: Duration::ZERO,
            },
        );
    }

    /// Every `(query, page)` requested so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, u32)> {
        lock(&self.calls).clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl SearchApi for ScriptedApi {
    async fn search_movies(&self, query: &str, page: u32) -> Result<SearchResponse> {
        lock(&self.calls).push((query.to_string(), page));

        let script = lock(&self.scripts).get(&(query.to_string(), page)).cloned();
        let Some(script) = script else {
            return Err(SearchError::Network(format!(
                "no scripted response for {query:?} page {page}"
            )));
        };

        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }

        match script.reply {
            Reply::Page(response) => Ok(response),
            Reply::Failure(message) => Err(SearchError::Network(message)),
        }
    }
}
