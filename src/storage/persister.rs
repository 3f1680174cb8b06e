//! Persistence adapter: cache load at startup and debounced background saves.
//!
//! Nothing here ever returns an error to the caller. Read failures fall back
//! to a cold-start default state and write failures are logged and dropped.

use super::backend::KeyValueStore;
use super::transform::{decode, encode, hydrate, project, PersistedShape, ROOT_KEY};
use crate::app::{CacheStore, SearchState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default quiet period before state changes are written out.
pub const DEFAULT_PERSIST_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Reads the persisted shape, or `None` when absent, unreadable or malformed.
pub fn load_persisted(store: &dyn KeyValueStore) -> Option<PersistedShape> {
    let blob = match store.get_item(ROOT_KEY) {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            tracing::debug!("no persisted state, cold start");
            return None;
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to read persisted state, cold start");
            return None;
        }
    };

    match decode(&blob) {
        Ok(shape) => {
            tracing::debug!(cached_pages = shape.cache.len(), "persisted state loaded");
            Some(shape)
        }
        Err(e) => {
            tracing::warn!(error = %e, "ignoring persisted state");
            None
        }
    }
}

/// Builds the startup state: defaults plus whatever cache could be restored.
pub fn rehydrate(store: &dyn KeyValueStore) -> SearchState {
    hydrate(load_persisted(store), SearchState::default())
}

/// Writes the cache under the root key. Best effort: failures are logged.
pub fn save_persisted(store: &dyn KeyValueStore, cache: &CacheStore) {
    let shape = PersistedShape {
        version: super::transform::FORMAT_VERSION,
        cache: cache.clone(),
    };
    match encode(&shape).and_then(|blob| store.set_item(ROOT_KEY, &blob)) {
        Ok(()) => tracing::debug!(cached_pages = cache.len(), "persisted state saved"),
        Err(e) => tracing::warn!(error = %e, "failed to save persisted state, dropping write"),
    }
}

/// Background task mirroring state changes into a [`KeyValueStore`].
///
/// Waits until the state has been quiet for the configured period, then
/// writes the projected cache if its serialized form differs from the last
/// write. Stops when every state sender is gone; dropping the handle aborts it.
#[derive(Debug)]
pub struct Persister {
    handle: JoinHandle<()>,
}

impl Persister {
    /// Spawns the persister on the current Tokio runtime.
    ///
    /// The state visible in `rx` at this moment is taken as already stored;
    /// any change sent after `spawn` returns is written once things go quiet.
    ///
    /// # Parameters
    ///
    /// * `store` - Destination for the serialized cache
    /// * `rx` - Receiver on the state owner's channel
    /// * `quiet` - How long the state must stay unchanged before a write
    ///
    /// # Returns
    ///
    /// A handle that aborts the task when dropped.
    #[must_use]
    pub fn spawn(
        store: Arc<dyn KeyValueStore>,
        mut rx: watch::Receiver<SearchState>,
        quiet: Duration,
    ) -> Self {
        let baseline = encode(&project(&rx.borrow_and_update())).ok();
        let handle = tokio::spawn(run(store, rx, quiet, baseline));
        Self { handle }
    }

    /// Whether the task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Persister {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(
    store: Arc<dyn KeyValueStore>,
    mut rx: watch::Receiver<SearchState>,
    quiet: Duration,
    mut last_written: Option<String>,
) {
    loop {
        if rx.changed().await.is_err() {
            break;
        }

        let mut closed = false;
        loop {
            match tokio::time::timeout(quiet, rx.changed()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => {
                    closed = true;
                    break;
                }
                Err(_) => break,
            }
        }

        let shape = project(&rx.borrow_and_update());
        match encode(&shape) {
            Ok(blob) if last_written.as_deref() == Some(blob.as_str()) => {
                tracing::trace!("cache unchanged, skipping write");
            }
            Ok(blob) => {
                let writer = Arc::clone(&store);
                let value = blob.clone();
                let written =
                    tokio::task::spawn_blocking(move || writer.set_item(ROOT_KEY, &value)).await;
                match written {
                    Ok(Ok(())) => {
                        tracing::debug!(cached_pages = shape.cache.len(), bytes = blob.len(), "cache persisted");
                        last_written = Some(blob);
                    }
                    Ok(Err(e)) => tracing::warn!(error = %e, "failed to persist cache, dropping write"),
                    Err(e) => tracing::warn!(error = %e, "persist task panicked, dropping write"),
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode cache, dropping write"),
        }

        if closed {
            break;
        }
    }

    tracing::debug!("persister stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::RequestStatus;
    use crate::domain::{PageResult, RequestKey, Result, SearchError};
    use crate::storage::MemoryStore;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get_item(&self, _key: &str) -> Result<Option<String>> {
            Err(SearchError::Persistence("unreadable".to_string()))
        }
        fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
            Err(SearchError::Persistence("read-only".to_string()))
        }
        fn remove_item(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    fn page(query: &str) -> PageResult {
        PageResult {
            results: vec![],
            page: 1,
            total_pages: 1,
            query: query.to_string(),
        }
    }

    #[test]
    fn rehydrates_cache_only_blob_into_idle_state() {
        let blob = r#"{"cache": {"x-1": {"results": [], "page": 1, "total_pages": 1, "query": "x"}}}"#;
        let store = MemoryStore::with_item(ROOT_KEY, blob);

        let state = rehydrate(&store);

        assert_eq!(state.status, RequestStatus::Idle);
        assert!(state.results.is_empty());
        assert_eq!(state.cache.get(&RequestKey::new("x", 1)), Some(&page("x")));
    }

    #[test]
    fn malformed_or_unreadable_storage_falls_back_to_defaults() {
        let store = MemoryStore::with_item(ROOT_KEY, "{\"cache\": 42}");
        assert_eq!(rehydrate(&store), SearchState::default());
        assert_eq!(rehydrate(&BrokenStore), SearchState::default());
        assert_eq!(rehydrate(&MemoryStore::new()), SearchState::default());
    }

    #[test]
    fn save_failures_are_swallowed() {
        let mut cache = CacheStore::new();
        cache.insert(RequestKey::new("x", 1), page("x"));
        save_persisted(&BrokenStore, &cache);
    }

    #[tokio::test(start_paused = true)]
    async fn writes_once_after_changes_settle() {
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = watch::channel(SearchState::default());
        let _persister = Persister::spawn(
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
            rx,
            Duration::from_millis(100),
        );

        tx.send_modify(|state| {
            state.cache.insert(RequestKey::new("a", 1), page("a"));
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send_modify(|state| {
            state.cache.insert(RequestKey::new("b", 1), page("b"));
        });
        assert_eq!(store.get_item(ROOT_KEY).unwrap(), None);

        tokio::time::sleep(Duration::from_millis(300)).await;
        let restored = load_persisted(store.as_ref()).unwrap();
        assert_eq!(restored.cache.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn flushes_pending_change_when_state_owner_goes_away() {
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = watch::channel(SearchState::default());
        let persister = Persister::spawn(
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
            rx,
            Duration::from_secs(5),
        );

        tx.send_modify(|state| {
            state.cache.insert(RequestKey::new("a", 1), page("a"));
        });
        tokio::task::yield_now().await;
        drop(tx);

        for _ in 0..20 {
            if persister.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(persister.is_finished());
        assert_eq!(load_persisted(store.as_ref()).unwrap().cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn change_sent_right_after_spawn_is_written() {
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = watch::channel(SearchState::default());
        let _persister = Persister::spawn(
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
            rx,
            Duration::from_millis(100),
        );

        tx.send_modify(|state| {
            state.cache.insert(RequestKey::new("a", 1), page("a"));
        });
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(load_persisted(store.as_ref()).unwrap().cache.len(), 1);
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn state_present_at_spawn_is_not_rewritten() {
        let mut initial = SearchState::default();
        initial.cache.insert(RequestKey::new("a", 1), page("a"));
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = watch::channel(initial);
        let _persister = Persister::spawn(
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
            rx,
            Duration::from_millis(100),
        );

        tx.send_modify(|state| state.status = RequestStatus::Loading);
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(store.get_item(ROOT_KEY).unwrap(), None);
        drop(tx);
    }
}
