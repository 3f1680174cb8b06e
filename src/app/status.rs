//! Request status state machine.
//!
//! ```text
//!            fetch                 ok
//!   idle ──────────▶ loading ─────────▶ succeeded
//!    ▲                  │ ▲                 │
//!    │            error │ └──── fetch ──────┤
//!    │                  ▼                   │
//!    │               failed ────────────────┘
//!    │                  │
//!    └── purge / clear ─┴── (from any state)
//! ```
//!
//! Only the fetch orchestrator moves a state through these transitions.

use serde::{Deserialize, Serialize};

/// Lifecycle of the most recent search request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Nothing requested since start or since the last purge.
    #[default]
    Idle,

    /// A request is in flight. Cache hits pass through this state too, so a
    /// cached answer looks exactly like a fast network answer.
    Loading,

    /// The last applied request produced a page.
    Succeeded,

    /// The last applied request failed; `SearchState::error` holds the reason.
    Failed,
}

impl RequestStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
