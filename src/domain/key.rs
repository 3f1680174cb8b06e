//! Request keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic identifier of a `(query, page)` request, `"{query}-{page}"`.
///
/// The query is whitespace-trimmed before formatting, so `" dune "` and `"dune"`
/// share a cache slot. Serializes as a bare string, which keeps persisted cache
/// maps readable (`{"dune-1": {...}}`).
///
/// # Examples
///
/// ```
/// use reelsearch::RequestKey;
///
/// assert_eq!(RequestKey::new(" dune ", 2).as_str(), "dune-2");
/// assert_eq!(RequestKey::new("dune", 2), RequestKey::new("dune  ", 2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestKey(String);

impl RequestKey {
    #[must_use]
    pub fn new(query: &str, page: u32) -> Self {
        Self(format!("{}-{page}", query.trim()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestKey {
    /// Wraps an already-formatted key, e.g. one read back from storage.
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}
