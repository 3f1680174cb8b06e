//! The fetch orchestrator.
//!
//! [`SearchStore`] owns the [`SearchState`] and is the only component that
//! changes it. State lives in a `tokio::sync::watch` channel: every mutation is
//! a single closure run under the channel's lock, so observers only ever see
//! whole transitions, and the view layer gets change notifications for free
//! through [`SearchStore::subscribe`].
//!
//! # Request ordering
//!
//! Every request takes a ticket carrying a sequence number, and `purge` /
//! `clear_cache` advance the sequence too. A resolution is applied to the view
//! only while its ticket is still the latest issued. An older successful page
//! is still added to the cache, unless the cache was cleared after the request
//! was issued.
//!
//! If the future driving a request is dropped before the response arrives, the
//! status it moved to `loading` is put back, so `loading` always means a
//! request is actually being awaited.

use super::accumulator::accumulate;
use super::state::SearchState;
use super::status::RequestStatus;
use crate::api::SearchApi;
use crate::domain::{PageResult, RequestKey, Result, SearchError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

/// A request admitted by the orchestrator, not yet resolved.
#[derive(Debug)]
struct Ticket {
    seq: u64,
    /// Cache generation at issue time; a clear in between voids the page.
    epoch: u64,
    key: RequestKey,
    query: String,
    page: u32,
    cached: Option<PageResult>,
    /// Status to restore if the request is abandoned.
    previous: RequestStatus,
}

/// Restores the pre-request status when a resolving future is dropped early.
struct Abandoned<'a> {
    store: &'a SearchStore,
    seq: u64,
    previous: RequestStatus,
    armed: bool,
}

impl Abandoned<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for Abandoned<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let (seq, previous) = (self.seq, self.previous);
        self.store.inner.state.send_if_modified(|state| {
            if !self.store.is_current(seq) || state.status != RequestStatus::Loading {
                return false;
            }
            tracing::debug!(seq, status = %previous, "request abandoned, restoring status");
            state.status = previous;
            true
        });
    }
}

struct Inner {
    api: Arc<dyn SearchApi>,
    state: watch::Sender<SearchState>,
    /// Highest sequence number issued. Only touched inside `state` closures.
    seq: AtomicU64,
    /// Bumped by every cache clear. Only touched inside `state` closures.
    cache_epoch: AtomicU64,
}

/// Cheaply cloneable handle to the search state and its four operations:
/// [`fetch`](Self::fetch), [`load_more`](Self::load_more),
/// [`purge`](Self::purge) and [`clear_cache`](Self::clear_cache).
#[derive(Clone)]
pub struct SearchStore {
    inner: Arc<Inner>,
}

impl SearchStore {
    /// Creates a store starting from `initial`.
    ///
    /// # Parameters
    ///
    /// * `api` - Search service every cache miss is sent to
    /// * `initial` - Starting state, usually a default or rehydrated one
    ///
    /// # Returns
    ///
    /// A handle whose clones all share the same state and sequence counter.
    #[must_use]
    pub fn new(api: Arc<dyn SearchApi>, initial: SearchState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner {
                api,
                state,
                seq: AtomicU64::new(0),
                cache_epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to state changes. The receiver starts at the current state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state.subscribe()
    }

    /// Fetches `page` of `query`, from cache when possible.
    ///
    /// On a cache hit the state still passes through `loading` before
    /// `succeeded`, and no network call is made. On a network success the page
    /// is cached and accumulated; on failure the status becomes `failed` with
    /// the error message while results and pagination are left untouched.
    ///
    /// The returned value is the page or error this request produced, whether
    /// or not it was still current enough to be applied to state. Dropping the
    /// returned future before it completes abandons the request and restores
    /// the previous status.
    ///
    /// # Parameters
    ///
    /// * `query` - Search text; surrounding whitespace is ignored
    /// * `page` - 1-based page number
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidRequest`] for a blank query or page 0
    /// (state is not touched), or the network error of a failed fetch.
    pub async fn fetch(&self, query: &str, page: u32) -> Result<PageResult> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidRequest("query must not be empty".to_string()));
        }
        if page == 0 {
            return Err(SearchError::InvalidRequest("pages start at 1".to_string()));
        }

        let requested = query.to_string();
        let ticket = self
            .issue(move |_| Some((requested, page)))
            .ok_or_else(|| SearchError::InvalidRequest("request was not admitted".to_string()))?;
        self.resolve(ticket).await
    }

    /// Fetches the page after the current one for the current query.
    ///
    /// Does nothing and returns `None` unless more pages exist and no request is
    /// in flight. The check and the transition to `loading` happen atomically,
    /// so two concurrent calls cannot both pass the guard.
    pub async fn load_more(&self) -> Option<Result<PageResult>> {
        let ticket = self.issue(|state| {
            state
                .can_load_more()
                .then(|| (state.query.clone(), state.current_page + 1))
        });

        match ticket {
            Some(ticket) => Some(self.resolve(ticket).await),
            None => {
                tracing::debug!("load more ignored, no further page or request in flight");
                None
            }
        }
    }

    /// Clears results and resets status, error and pagination. Keeps the cache.
    pub fn purge(&self) {
        let _span = tracing::debug_span!("purge").entered();
        self.inner.state.send_modify(|state| {
            self.advance_seq();
            state.reset_view();
        });
        tracing::debug!("results purged");
    }

    /// Same as [`purge`](Self::purge), and empties the cache.
    pub fn clear_cache(&self) {
        let _span = tracing::debug_span!("clear_cache").entered();
        self.inner.state.send_modify(|state| {
            self.advance_seq();
            self.inner.cache_epoch.fetch_add(1, Ordering::SeqCst);
            state.reset_view();
            state.cache.clear();
        });
        tracing::debug!("results purged and cache cleared");
    }

    fn advance_seq(&self) -> u64 {
        self.inner.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, seq: u64) -> bool {
        self.inner.seq.load(Ordering::SeqCst) == seq
    }

    /// Admits a request chosen by `select` from the current state.
    ///
    /// Runs entirely under the state lock: picks the target, takes a sequence
    /// number, looks the key up in the cache and moves the status to `loading`.
    fn issue<F>(&self, select: F) -> Option<Ticket>
    where
        F: FnOnce(&SearchState) -> Option<(String, u32)>,
    {
        let mut ticket = None;
        self.inner.state.send_if_modified(|state| {
            let Some((query, page)) = select(state) else {
                return false;
            };
            let key = RequestKey::new(&query, page);
            let cached = state.cache.get(&key).cloned();
            let previous = state.status;
            state.status = RequestStatus::Loading;
            ticket = Some(Ticket {
                seq: self.advance_seq(),
                epoch: self.inner.cache_epoch.load(Ordering::SeqCst),
                key,
                query,
                page,
                cached,
                previous,
            });
            true
        });
        ticket
    }

    async fn resolve(&self, ticket: Ticket) -> Result<PageResult> {
        let span = tracing::debug_span!(
            "fetch",
            query = %ticket.query,
            page = ticket.page,
            seq = ticket.seq
        );

        let mut guard = Abandoned {
            store: self,
            seq: ticket.seq,
            previous: ticket.previous,
            armed: true,
        };

        async move {
            if let Some(page) = ticket.cached {
                tracing::debug!(key = %ticket.key, "cache hit");
                guard.disarm();
                self.apply_success(ticket.seq, None, &page);
                return Ok(page);
            }

            tracing::debug!(key = %ticket.key, "cache miss, querying search service");
            let outcome = self.inner.api.search_movies(&ticket.query, ticket.page).await;
            guard.disarm();
            match outcome {
                Ok(response) => {
                    let page = response.into_page(ticket.query);
                    self.apply_success(ticket.seq, Some((ticket.key, ticket.epoch)), &page);
                    Ok(page)
                }
                Err(err) => {
                    self.apply_failure(ticket.seq, &err);
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Caches `page` under `key` unless the cache was cleared since `epoch`,
    /// then accumulates it if `seq` is still current.
    fn apply_success(&self, seq: u64, key: Option<(RequestKey, u64)>, page: &PageResult) {
        self.inner.state.send_if_modified(|state| {
            let mut cached = false;
            if let Some((key, epoch)) = key {
                if self.inner.cache_epoch.load(Ordering::SeqCst) == epoch {
                    cached = state.cache.insert(key, page.clone());
                } else {
                    tracing::debug!(key = %key, "cache cleared in flight, not caching");
                }
            }
            if !self.is_current(seq) {
                tracing::debug!(seq, cached, "stale result, not applied to view");
                return cached;
            }
            accumulate(state, page);
            state.status = RequestStatus::Succeeded;
            state.error = None;
            true
        });
    }

    fn apply_failure(&self, seq: u64, err: &SearchError) {
        self.inner.state.send_if_modified(|state| {
            if !self.is_current(seq) {
                tracing::debug!(seq, error = %err, "discarding stale failure");
                return false;
            }
            tracing::debug!(error = %err, "search request failed");
            state.status = RequestStatus::Failed;
            state.error = Some(err.user_message());
            true
        });
    }
}

impl std::fmt::Debug for SearchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchStore")
            .field("seq", &self.inner.seq.load(Ordering::SeqCst))
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ScriptedApi;
    use crate::domain::Movie;
    use std::time::Duration;

    fn movies(ids: &[i64]) -> Vec<Movie> {
        ids.iter()
            .map(|id| Movie::new(*id, format!("movie {id}"), "1999-01-01", None))
            .collect()
    }

    fn ids(state: &SearchState) -> Vec<i64> {
        state.results.iter().map(|m| m.id).collect()
    }

    fn store_with(api: &Arc<ScriptedApi>) -> SearchStore {
        SearchStore::new(Arc::clone(api) as Arc<dyn SearchApi>, SearchState::default())
    }

    #[tokio::test]
    async fn repeated_fetch_is_served_from_cache() {
        let api = Arc::new(ScriptedApi::new().with_page("q", 1, 2, movies(&[1, 2])));
        let store = store_with(&api);

        let first = store.fetch("q", 1).await.unwrap();
        let second = store.fetch("q", 1).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.call_count(), 1);
        assert_eq!(store.state().status, RequestStatus::Succeeded);
    }

    #[tokio::test]
    async fn pages_accumulate_in_order() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_page("q", 1, 2, movies(&[1, 2]))
                .with_page("q", 2, 2, movies(&[3, 1])),
        );
        let store = store_with(&api);

        store.fetch("q", 1).await.unwrap();
        store.fetch("q", 2).await.unwrap();

        let state = store.state();
        assert_eq!(ids(&state), vec![1, 2, 3, 1]);
        assert_eq!(state.current_page, 2);
        assert_eq!(state.total_pages, 2);
    }

    #[tokio::test]
    async fn new_query_replaces_previous_results() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_page("alien", 1, 1, movies(&[1, 2]))
                .with_page("dune", 1, 1, movies(&[7])),
        );
        let store = store_with(&api);

        store.fetch("alien", 1).await.unwrap();
        store.fetch("dune", 1).await.unwrap();

        assert_eq!(ids(&store.state()), vec![7]);
        assert_eq!(store.state().query, "dune");
    }

    #[tokio::test]
    async fn purge_keeps_cache_and_clear_cache_drops_it() {
        let api = Arc::new(ScriptedApi::new().with_page("q", 1, 1, movies(&[1])));
        let store = store_with(&api);

        store.fetch("q", 1).await.unwrap();
        store.purge();

        let purged = store.state();
        assert!(purged.results.is_empty());
        assert_eq!(purged.status, RequestStatus::Idle);
        assert_eq!(purged.cache.len(), 1);

        store.fetch("q", 1).await.unwrap();
        assert_eq!(api.call_count(), 1);

        store.clear_cache();
        assert!(store.state().cache.is_empty());

        store.fetch("q", 1).await.unwrap();
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn failure_preserves_previous_results() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_page("q", 1, 3, movies(&[1, 2]))
                .with_failure("q", 2, "Network Error"),
        );
        let store = store_with(&api);

        store.fetch("q", 1).await.unwrap();
        let err = store.fetch("q", 2).await.unwrap_err();
        assert!(err.is_network());

        let state = store.state();
        assert_eq!(ids(&state), vec![1, 2]);
        assert_eq!(state.status, RequestStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("Network Error"));
        assert_eq!((state.current_page, state.total_pages), (1, 3));
    }

    #[tokio::test]
    async fn success_clears_previous_error() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_failure("bad", 1, "boom")
                .with_page("good", 1, 1, movies(&[4])),
        );
        let store = store_with(&api);

        let _ = store.fetch("bad", 1).await;
        store.fetch("good", 1).await.unwrap();

        assert_eq!(store.state().error, None);
        assert_eq!(store.state().status, RequestStatus::Succeeded);
    }

    #[tokio::test]
    async fn load_more_fetches_next_page_until_exhausted() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_page("q", 1, 2, movies(&[1]))
                .with_page("q", 2, 2, movies(&[2])),
        );
        let store = store_with(&api);

        assert!(store.load_more().await.is_none());

        store.fetch("q", 1).await.unwrap();
        let page = store.load_more().await.unwrap().unwrap();
        assert_eq!(page.page, 2);

        assert!(store.load_more().await.is_none());
        assert_eq!(ids(&store.state()), vec![1, 2]);
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn blank_query_and_page_zero_are_rejected_without_state_change() {
        let api = Arc::new(ScriptedApi::new());
        let store = store_with(&api);

        assert!(matches!(
            store.fetch("   ", 1).await,
            Err(SearchError::InvalidRequest(_))
        ));
        assert!(matches!(
            store.fetch("q", 0).await,
            Err(SearchError::InvalidRequest(_))
        ));
        assert_eq!(store.state(), SearchState::default());
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn query_is_trimmed_for_key_and_request() {
        let api = Arc::new(ScriptedApi::new().with_page("q", 1, 1, movies(&[1])));
        let store = store_with(&api);

        store.fetch("  q ", 1).await.unwrap();
        store.fetch("q", 1).await.unwrap();

        assert_eq!(api.calls(), vec![("q".to_string(), 1)]);
        assert!(store.state().cache.contains(&RequestKey::new("q", 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_is_cached_but_not_shown() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_page("q", 1, 3, movies(&[1]))
                .with_page("q", 2, 3, movies(&[2]))
                .with_delay("q", 2, Duration::from_millis(500))
                .with_page("other", 1, 1, movies(&[9])),
        );
        let store = store_with(&api);
        store.fetch("q", 1).await.unwrap();

        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.load_more().await })
        };
        tokio::task::yield_now().await;
        assert!(store.state().is_loading());

        store.fetch("other", 1).await.unwrap();
        let stale = slow.await.unwrap().unwrap().unwrap();
        assert_eq!(stale.page, 2);

        let state = store.state();
        assert_eq!(ids(&state), vec![9]);
        assert_eq!(state.query, "other");
        assert_eq!(state.status, RequestStatus::Succeeded);
        assert!(state.cache.contains(&RequestKey::new("q", 2)));
    }

    #[tokio::test(start_paused = true)]
    async fn response_arriving_after_purge_is_discarded() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_page("q", 1, 1, movies(&[1]))
                .with_delay("q", 1, Duration::from_millis(300)),
        );
        let store = store_with(&api);

        let pending = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch("q", 1).await })
        };
        tokio::task::yield_now().await;
        store.purge();

        pending.await.unwrap().unwrap();
        let state = store.state();
        assert!(state.results.is_empty());
        assert_eq!(state.status, RequestStatus::Idle);
        assert!(state.cache.contains(&RequestKey::new("q", 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn response_arriving_after_cache_clear_is_not_cached() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_page("q", 1, 1, movies(&[1]))
                .with_delay("q", 1, Duration::from_millis(300)),
        );
        let store = store_with(&api);

        let pending = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch("q", 1).await })
        };
        tokio::task::yield_now().await;
        store.clear_cache();

        pending.await.unwrap().unwrap();
        assert!(store.state().cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_load_more_restores_status() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_page("q", 1, 3, movies(&[1]))
                .with_page("q", 2, 3, movies(&[2]))
                .with_delay("q", 2, Duration::from_secs(5)),
        );
        let store = store_with(&api);
        store.fetch("q", 1).await.unwrap();

        let gave_up = tokio::time::timeout(Duration::from_millis(100), store.load_more()).await;
        assert!(gave_up.is_err());
        tokio::time::sleep(Duration::from_secs(60)).await;

        let state = store.state();
        assert_eq!(state.status, RequestStatus::Succeeded);
        assert!(state.can_load_more());
        assert_eq!(ids(&state), vec![1]);

        api.set_page("q", 2, 3, movies(&[2]));
        let page = store.load_more().await.unwrap().unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(ids(&store.state()), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_fetch_leaves_newer_request_alone() {
        let api = Arc::new(
            ScriptedApi::new()
                .with_page("slow", 1, 1, movies(&[1]))
                .with_delay("slow", 1, Duration::from_secs(5))
                .with_page("fast", 1, 1, movies(&[2]))
                .with_delay("fast", 1, Duration::from_millis(200)),
        );
        let store = store_with(&api);

        let abandoned = {
            let store = store.clone();
            tokio::spawn(async move {
                tokio::time::timeout(Duration::from_millis(50), store.fetch("slow", 1)).await
            })
        };
        while !store.state().is_loading() {
            tokio::task::yield_now().await;
        }
        let in_flight = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch("fast", 1).await })
        };
        tokio::task::yield_now().await;

        assert!(abandoned.await.unwrap().is_err());
        assert!(store.state().is_loading());

        in_flight.await.unwrap().unwrap();
        assert_eq!(store.state().status, RequestStatus::Succeeded);
        assert_eq!(ids(&store.state()), vec![2]);
    }

    #[tokio::test]
    async fn cache_hit_passes_through_loading() {
        let api = Arc::new(ScriptedApi::new().with_page("q", 1, 1, movies(&[1])));
        let store = store_with(&api);
        store.fetch("q", 1).await.unwrap();
        store.purge();

        let mut rx = store.subscribe();
        rx.borrow_and_update();
        let ticket = store.issue(|_| Some(("q".to_string(), 1))).unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().status, RequestStatus::Loading);
        assert!(ticket.cached.is_some());

        store.resolve(ticket).await.unwrap();
        assert_eq!(rx.borrow_and_update().status, RequestStatus::Succeeded);
    }
}
