//! View-facing search controller.

use super::actions::{Command, CommandSink};
use super::debouncer::Debouncer;
use super::orchestrator::SearchStore;
use super::state::SearchState;
use crate::api::SearchApi;
use crate::domain::{PageResult, Result};
use crate::storage::{rehydrate, save_persisted, KeyValueStore, Persister};
use crate::Config;
use std::sync::Arc;
use tokio::sync::watch;

/// Everything the search screen talks to.
///
/// A session rehydrates the cache from storage, feeds keystrokes through a
/// [`Debouncer`] into a [`SearchStore`], and keeps a background [`Persister`]
/// mirroring the cache back to storage. The view calls the four `on_*`
/// callbacks and renders [`state`](Self::state) or a [`subscribe`](Self::subscribe)
/// receiver.
///
/// Must be created inside a Tokio runtime. Dropping the session cancels any
/// pending debounce and stops the persister; call [`shutdown`](Self::shutdown)
/// instead to also write the cache out one last time.
///
/// # Examples
///
/// ```
/// use reelsearch::api::ScriptedApi;
/// use reelsearch::storage::MemoryStore;
/// use reelsearch::{Config, Movie, SearchSession};
/// use std::sync::Arc;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build()?.block_on(async {
/// let api = Arc::new(ScriptedApi::new().with_page("dune", 1, 1, vec![
///     Movie::new(438631, "Dune", "2021-09-15", None),
/// ]));
/// let mut session = SearchSession::new(&Config::default(), api, Arc::new(MemoryStore::new()));
///
/// let mut updates = session.subscribe();
/// session.on_query_changed("dune");
/// while updates.borrow_and_update().results.is_empty() {
///     updates.changed().await?;
/// }
/// assert_eq!(session.state().results[0].title, "Dune");
/// session.shutdown().await;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SearchSession {
    store: SearchStore,
    debouncer: Debouncer,
    storage: Arc<dyn KeyValueStore>,
    persister: Option<Persister>,
}

impl SearchSession {
    /// Builds a session, restoring whatever cache `storage` holds.
    ///
    /// Storage problems never fail construction; they degrade to an empty
    /// cache and are logged.
    ///
    /// # Parameters
    ///
    /// * `config` - Debounce and persistence timings
    /// * `api` - Search service used on cache misses
    /// * `storage` - Where the cache is restored from and mirrored to
    ///
    /// # Returns
    ///
    /// A running session. Its persister and debouncer live on the current
    /// Tokio runtime, so this panics outside of one.
    #[must_use]
    pub fn new(config: &Config, api: Arc<dyn SearchApi>, storage: Arc<dyn KeyValueStore>) -> Self {
        let _span = tracing::debug_span!("session_new").entered();

        let initial = rehydrate(storage.as_ref());
        tracing::debug!(cached_pages = initial.cache.len(), "search state rehydrated");

        let store = SearchStore::new(api, initial);
        let persister = Persister::spawn(
            Arc::clone(&storage),
            store.subscribe(),
            config.persist_debounce(),
        );
        let debouncer = Debouncer::new(config.debounce(), command_sink(store.clone()));

        Self {
            store,
            debouncer,
            storage,
            persister: Some(persister),
        }
    }

    /// The input text changed. Debounced; an empty query purges immediately.
    pub fn on_query_changed(&mut self, text: &str) {
        self.debouncer.push(text);
    }

    /// The list was scrolled to its end.
    ///
    /// Returns `None` when there is nothing more to load or a request is
    /// already in flight.
    pub async fn on_load_more_requested(&self) -> Option<Result<PageResult>> {
        self.store.load_more().await
    }

    /// Drops the current results. Also discards any keystroke still waiting
    /// out the debounce period.
    pub fn on_purge_requested(&mut self) {
        self.debouncer.cancel();
        self.store.purge();
    }

    /// Drops the current results and the whole cache.
    pub fn on_clear_cache_requested(&mut self) {
        self.debouncer.cancel();
        self.store.clear_cache();
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SearchState {
        self.store.state()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.store.subscribe()
    }

    /// The underlying store, for callers that drive fetches directly.
    #[must_use]
    pub const fn store(&self) -> &SearchStore {
        &self.store
    }

    /// Writes the current cache to storage right away, off the async worker
    /// threads. Best effort.
    pub async fn flush(&self) {
        let storage = Arc::clone(&self.storage);
        let cache = self.store.state().cache;
        if let Err(e) =
            tokio::task::spawn_blocking(move || save_persisted(storage.as_ref(), &cache)).await
        {
            tracing::warn!(error = %e, "cache flush did not complete");
        }
    }

    /// Stops the session and writes the cache out one last time.
    pub async fn shutdown(mut self) {
        self.debouncer.cancel();
        drop(self.persister.take());
        self.flush().await;
        tracing::debug!("search session shut down");
    }
}

/// Executes debouncer commands against `store`. Fetches run as their own tasks
/// so the timer callback never waits on the network.
fn command_sink(store: SearchStore) -> CommandSink {
    Arc::new(move |command: Command| match command {
        Command::Fetch { query, page } => {
            let store = store.clone();
            tokio::spawn(async move {
                if let Err(e) = store.fetch(&query, page).await {
                    tracing::debug!(error = %e, query = %query, page, "debounced fetch failed");
                }
            });
        }
        Command::Purge => store.purge(),
    })
}

impl std::fmt::Debug for SearchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("store", &self.store)
            .field("debouncer", &self.debouncer)
            .finish_non_exhaustive()
    }
}
