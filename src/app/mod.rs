//! Request-state management for the search screen.
//!
//! This module turns keystrokes into debounced, cache-aware, paginated search
//! requests and owns the state the view renders.
//!
//! # Architecture
//!
//! ```text
//! on_query_changed → Debouncer → Command → SearchStore::fetch ─┬─ cache hit
//!                                                              └─ SearchApi
//!                                                                    ↓
//!        view ← watch::Receiver<SearchState> ← accumulate ←──────────┘
//! ```
//!
//! Purge and clear-cache requests skip the debouncer and go straight to the
//! store.
//!
//! # Modules
//!
//! - [`accumulator`]: merges successive pages into the result list
//! - [`actions`]: commands emitted by the debouncer
//! - [`cache`]: append-only page cache keyed by request key
//! - [`debouncer`]: keystroke burst collapsing
//! - [`orchestrator`]: the state-owning fetch state machine
//! - [`scheduler`]: cancellable delayed task handle
//! - [`session`]: view-facing controller wiring everything together
//! - [`state`]: the observable search state
//! - [`status`]: request lifecycle status

pub mod accumulator;
pub mod actions;
pub mod cache;
pub mod debouncer;
pub mod orchestrator;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod status;

pub use accumulator::accumulate;
pub use actions::{Command, CommandSink};
pub use cache::CacheStore;
pub use debouncer::{Debouncer, DEFAULT_DEBOUNCE};
pub use orchestrator::SearchStore;
pub use scheduler::ScheduledTask;
pub use session::SearchSession;
pub use state::SearchState;
pub use status::RequestStatus;
