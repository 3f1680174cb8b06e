//! Commands emitted by the debouncer toward the fetch orchestrator.
//!
//! The debouncer never touches state itself. It turns keystrokes into
//! [`Command`]s and hands them to a [`CommandSink`]; the search session owns the
//! sink and executes each command against the orchestrator.

use std::sync::Arc;

/// A request produced by the debouncer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch the first page of a new query.
    Fetch {
        /// Whitespace-trimmed, non-empty query text.
        query: String,
        page: u32,
    },

    /// The input was cleared; drop the current results immediately.
    Purge,
}

impl Command {
    /// Fetch of page 1 for `query`.
    #[must_use]
    pub fn fetch_first(query: impl Into<String>) -> Self {
        Self::Fetch {
            query: query.into(),
            page: 1,
        }
    }
}

/// Receiver of debouncer output. Called from the timer task, so it must be
/// cheap and must not block.
pub type CommandSink = Arc<dyn Fn(Command) + Send + Sync>;
