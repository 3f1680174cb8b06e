//! Keystroke debouncing.
//!
//! [`Debouncer`] collapses a burst of query changes into one [`Command::Fetch`]
//! carrying the last text, emitted once the input has been quiet for the
//! configured period. Clearing the input is not debounced: it cancels the
//! pending timer and emits [`Command::Purge`] right away.

use super::actions::{Command, CommandSink};
use super::scheduler::ScheduledTask;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default quiet period between the last keystroke and the fetch.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Owns at most one pending timer at a time.
///
/// Every keystroke bumps a generation counter and replaces the pending timer.
/// The timer callback re-checks the generation before emitting, so a timer
/// that fires while being replaced on another worker thread stays silent.
pub struct Debouncer {
    quiet: Duration,
    sink: CommandSink,
    pending: Option<ScheduledTask>,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    #[must_use]
    pub fn new(quiet: Duration, sink: CommandSink) -> Self {
        Self {
            quiet,
            sink,
            pending: None,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Feeds one raw input value.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn push(&mut self, text: &str) {
        self.cancel();
        let generation = self.generation.load(Ordering::SeqCst);

        let query = text.trim();
        if query.is_empty() {
            tracing::debug!("query cleared, purging without debounce");
            (self.sink)(Command::Purge);
            return;
        }

        tracing::trace!(query = %query, quiet_ms = self.quiet.as_millis(), "debounce timer armed");

        let sink = Arc::clone(&self.sink);
        let current = Arc::clone(&self.generation);
        let query = query.to_string();
        self.pending = Some(ScheduledTask::schedule(self.quiet, move || {
            if current.load(Ordering::SeqCst) != generation {
                tracing::trace!("superseded debounce timer fired, ignoring");
                return;
            }
            tracing::debug!(query = %query, "debounce elapsed, emitting fetch");
            sink(Command::fetch_first(query));
        }));
    }

    /// Cancels the pending timer, if any.
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.pending.take() {
            task.cancel();
        }
    }

    /// Whether a timer is armed and has not fired yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }

    #[must_use]
    pub const fn quiet_period(&self) -> Duration {
        self.quiet
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("quiet", &self.quiet)
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}
