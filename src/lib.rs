//! Reelsearch: request-state manager for a movie search screen.
//!
//! Reelsearch sits between a search screen and a paginated movie search API.
//! It provides:
//! - Debounced keystroke handling with an immediate purge on empty input
//! - Cache-aware fetching keyed by trimmed query and page
//! - Infinite-scroll accumulation of successive result pages
//! - Stale-response suppression across overlapping requests
//! - Cache persistence across restarts through a pluggable key/value store
//! - A single observable, serializable state snapshot for the view

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  View layer (host application)                      │  ← External
//! └─────────────────────────────────────────────────────┘
//!             │ on_* callbacks         ↑ SearchState
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │
//! │  - SearchSession: view-facing controller            │
//! │  - Debouncer + ScheduledTask                        │
//! │  - SearchStore: fetch orchestrator, state owner     │
//! │  - Accumulator and page cache                       │
//! └─────────────────────────────────────────────────────┘
//!         │                                    │
//! ┌───────────────────────┐        ┌───────────────────────┐
//! │ API Layer (api/)      │        │ Storage Layer         │
//! │ - SearchApi trait     │        │ (storage/)            │
//! │ - TmdbClient (HTTP)   │        │ - KeyValueStore trait │
//! │ - ScriptedApi (tests) │        │ - JSON file / memory  │
//! └───────────────────────┘        │ - Debounced persister │
//!                                  └───────────────────────┘
//!         │                                    │
//! ┌─────────────────────────────────────────────────────┐
//! │  Infrastructure & Domain Layers                     │
//! │  - Data directory resolution (infrastructure/)      │
//! │  - Error types (domain/error)                       │
//! │  - Movie, page and request key models (domain/)     │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │  ← Optional
//! │  - OpenTelemetry tracing                            │
//! │  - JSON-lines span file export                      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Search state, debouncing and the fetch orchestrator
//! - [`api`]: Search service boundary and its implementations
//! - [`domain`]: Core domain types (movies, pages, keys, errors)
//! - [`infrastructure`]: Platform-specific utilities (paths)
//! - [`storage`]: Cache persistence
//! - [`observability`]: OpenTelemetry tracing to a local span file
//!
//! # Configuration
//!
//! Hosts either build a [`Config`] in code, hand over their key/value
//! environment with [`Config::from_map`], or point at a TOML file:
//!
//! ```toml
//! base_url = "https://api.themoviedb.org/3"
//! auth_token = "eyJhbGciOi..."
//! debounce_ms = 200
//! trace_level = "debug"
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration**: parse and [`Config::validate`]
//! 2. **Tracing**: install the span file exporter if `trace_level` is set
//! 3. **Storage**: open `<data_dir>/state.json`, falling back to memory
//! 4. **Rehydration**: restore the cache into a fresh idle state
//! 5. **Session**: start the persister and hand the session to the view
//!
//! # Examples
//!
//! ```no_run
//! use reelsearch::{initialize, Config};
//!
//! # async fn run() -> reelsearch::Result<()> {
//! let config = Config {
//!     auth_token: std::env::var("TMDB_TOKEN").unwrap_or_default(),
//!     ..Config::default()
//! };
//!
//! let mut session = initialize(&config)?;
//! let mut updates = session.subscribe();
//!
//! session.on_query_changed("blade runner");
//! while updates.changed().await.is_ok() {
//!     let state = updates.borrow_and_update().clone();
//!     println!("{}: {} movies", state.status, state.results.len());
//!     if !state.is_loading() {
//!         break;
//!     }
//! }
//!
//! session.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod observability;
pub mod storage;

pub use app::{RequestStatus, SearchSession, SearchState, SearchStore};
pub use domain::{Movie, PageResult, RequestKey, Result, SearchError};

use api::TmdbClient;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use storage::{JsonFileStore, KeyValueStore, MemoryStore};

/// File name of the persisted state inside the data directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// Runtime configuration.
///
/// # Example
///
/// ```toml
/// debounce_ms = 300
/// base_url = "https://api.themoviedb.org/3"
/// auth_token = "eyJhbGciOi..."
/// image_base_url = "https://image.tmdb.org/t/p/w185"
/// request_timeout_ms = 10000
/// persist_debounce_ms = 1000
/// data_dir = "~/.local/share/reelsearch"
/// trace_level = "debug"
/// ```
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Quiet period after the last keystroke before a search is sent.
    /// Default: `200`
    pub debounce_ms: u64,

    /// Root of the search service, without the `/search/movie` suffix.
    pub base_url: String,

    /// Bearer token sent with every search request.
    pub auth_token: String,

    /// Prefix joined with a movie's poster path to build its image URL.
    pub image_base_url: String,

    /// Per-request timeout. Default: `10000`
    pub request_timeout_ms: u64,

    /// Quiet period after the last state change before the cache is written.
    /// Default: `1000`
    pub persist_debounce_ms: u64,

    /// Directory for persisted state and span files.
    ///
    /// A leading `~` is expanded. Defaults to `$XDG_DATA_HOME/reelsearch`,
    /// then `~/.local/share/reelsearch`.
    pub data_dir: Option<String>,

    /// Tracing level for OpenTelemetry spans.
    ///
    /// Any `EnvFilter` directive, e.g. `debug` or `reelsearch=trace`.
    /// Default: `"info"`
    pub trace_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            base_url: "https://api.themoviedb.org/3".to_string(),
            auth_token: String::new(),
            image_base_url: "https://image.tmdb.org/t/p/w185".to_string(),
            request_timeout_ms: 10_000,
            persist_debounce_ms: 1_000,
            data_dir: None,
            trace_level: None,
        }
    }
}

impl Config {
    /// Parses configuration from a flat key/value map, such as the embedding
    /// application's environment.
    ///
    /// Missing keys and unparseable numbers fall back to their defaults;
    /// empty strings count as missing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use reelsearch::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("auth_token".to_string(), "token".to_string());
    /// map.insert("debounce_ms".to_string(), "350".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert_eq!(config.debounce_ms, 350);
    /// assert_eq!(config.base_url, "https://api.themoviedb.org/3");
    /// ```
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| {
            map.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(String::from)
        };
        let millis = |key: &str, fallback: u64| {
            text(key)
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(fallback)
        };

        Self {
            debounce_ms: millis("debounce_ms", defaults.debounce_ms),
            base_url: text("base_url").unwrap_or(defaults.base_url),
            auth_token: text("auth_token").unwrap_or(defaults.auth_token),
            image_base_url: text("image_base_url").unwrap_or(defaults.image_base_url),
            request_timeout_ms: millis("request_timeout_ms", defaults.request_timeout_ms),
            persist_debounce_ms: millis("persist_debounce_ms", defaults.persist_debounce_ms),
            data_dir: text("data_dir"),
            trace_level: text("trace_level"),
        }
    }

    /// Parses a TOML document. Omitted keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] on invalid TOML, unknown keys or
    /// mistyped values.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| SearchError::Config(format!("invalid config: {e}")))
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Io`] if the file cannot be read, or
    /// [`SearchError::Config`] if it does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = ?path, "loading configuration file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Checks the values a session cannot run without.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] when `base_url` or `auth_token` is
    /// blank, or the request timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(SearchError::Config("base_url must not be empty".to_string()));
        }
        if self.auth_token.trim().is_empty() {
            return Err(SearchError::Config("auth_token must not be empty".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(SearchError::Config(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[must_use]
    pub const fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("debounce_ms", &self.debounce_ms)
            .field("base_url", &self.base_url)
            .field("auth_token", &if self.auth_token.is_empty() { "" } else { "<redacted>" })
            .field("image_base_url", &self.image_base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("persist_debounce_ms", &self.persist_debounce_ms)
            .field("data_dir", &self.data_dir)
            .field("trace_level", &self.trace_level)
            .finish()
    }
}

/// Builds a ready-to-use search session from configuration.
///
/// Validates `config`, installs tracing when `trace_level` is set, opens the JSON state file in the data
/// directory and wires a [`TmdbClient`] into a new [`SearchSession`]. If the
/// state file cannot be opened the session runs on an in-memory store instead.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the configuration is invalid or the
/// HTTP client cannot be built.
pub fn initialize(config: &Config) -> Result<SearchSession> {
    config.validate()?;
    if config.trace_level.is_some() {
        observability::init_tracing(config);
    }

    tracing::debug!("initializing reelsearch session");

    let api = Arc::new(TmdbClient::new(config)?);

    let state_file = infrastructure::data_dir(config).join(STATE_FILE_NAME);
    let storage: Arc<dyn KeyValueStore> = match JsonFileStore::open(state_file) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(error = %e, "state file unavailable, cache will not survive restarts");
            Arc::new(MemoryStore::new())
        }
    };

    Ok(SearchSession::new(config, api, storage))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.debounce(), Duration::from_millis(200));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.persist_debounce(), Duration::from_secs(1));
        assert_eq!(config.base_url, "https://api.themoviedb.org/3");
        assert!(config.auth_token.is_empty());
    }

    #[test]
    fn from_map_falls_back_on_missing_or_invalid_values() {
        let mut map = BTreeMap::new();
        map.insert("debounce_ms".to_string(), "soon".to_string());
        map.insert("auth_token".to_string(), "  ".to_string());
        map.insert("trace_level".to_string(), "debug".to_string());
        map.insert("data_dir".to_string(), "/var/lib/reelsearch".to_string());

        let config = Config::from_map(&map);

        assert_eq!(config.debounce_ms, 200);
        assert!(config.auth_token.is_empty());
        assert_eq!(config.trace_level.as_deref(), Some("debug"));
        assert_eq!(config.data_dir.as_deref(), Some("/var/lib/reelsearch"));
    }

    #[test]
    fn toml_overrides_only_given_keys() {
        let config = Config::from_toml_str(
            r#"
            auth_token = "abc"
            debounce_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.auth_token, "abc");
        assert_eq!(config.debounce_ms, 500);
        assert_eq!(config.persist_debounce_ms, 1_000);
    }

    #[test]
    fn toml_rejects_unknown_keys_and_bad_types() {
        assert!(matches!(
            Config::from_toml_str("scan_depth = 4"),
            Err(SearchError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("debounce_ms = \"fast\""),
            Err(SearchError::Config(_))
        ));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reelsearch.toml");
        std::fs::write(&path, "auth_token = \"abc\"\nrequest_timeout_ms = 2500\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_millis(2500));

        assert!(matches!(
            Config::from_file(dir.path().join("missing.toml")),
            Err(SearchError::Io(_))
        ));
    }

    #[test]
    fn validate_requires_url_and_token() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.auth_token = "abc".to_string();
        assert!(config.validate().is_ok());

        config.base_url = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = Config {
            auth_token: "very-secret".to_string(),
            ..Config::default()
        };
        assert!(!format!("{config:?}").contains("very-secret"));
    }

    #[tokio::test]
    async fn initialize_uses_state_file_in_data_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            auth_token: "abc".to_string(),
            data_dir: Some(dir.path().to_string_lossy().into_owned()),
            ..Config::default()
        };

        let session = initialize(&config).unwrap();
        assert_eq!(session.state(), SearchState::default());
        session.shutdown().await;

        assert!(dir.path().join(STATE_FILE_NAME).exists());
    }

    #[test]
    fn initialize_rejects_invalid_config() {
        assert!(matches!(
            initialize(&Config::default()),
            Err(SearchError::Config(_))
        ));
    }
}
