//! Error types for the search core.
//!
//! This module defines the centralized error type [`SearchError`] and a type alias
//! [`Result`] used throughout the crate. All errors are implemented using the
//! `thiserror` crate for automatic `Error` trait implementation.
//!
//! Only network-flavoured errors ever reach the view layer, and they do so as a
//! plain string through [`SearchError::user_message`]. Persistence errors are
//! logged and recovered where they occur.

use thiserror::Error;

/// Message shown to the user when the search service answers with a payload
/// that does not have the expected shape.
pub const MALFORMED_RESPONSE_MESSAGE: &str = "Unexpected response from the search service";

/// The main error type for search operations.
///
/// # Examples
///
/// ```
/// use reelsearch::SearchError;
///
/// let err = SearchError::Network("Request failed with status code 401".to_string());
/// assert_eq!(err.user_message(), "Request failed with status code 401");
/// assert!(err.is_network());
/// ```
#[derive(Debug, Error)]
pub enum SearchError {
    /// Transport or HTTP failure talking to the search service.
    ///
    /// The string is the message surfaced verbatim in `state.error`.
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The search service answered with an unexpected payload shape.
    ///
    /// Treated exactly like a network failure by the orchestrator, but surfaced
    /// with a generic message.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Reading or writing persisted state failed.
    ///
    /// Never surfaced to the view layer: reads fall back to defaults and writes
    /// are dropped.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A fetch was requested with arguments that can never produce a page
    /// (blank query, page 0).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SearchError {
    /// Returns the message stored in `SearchState::error` for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(message) | Self::Timeout(message) => message.clone(),
            Self::MalformedResponse(_) => MALFORMED_RESPONSE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this error belongs to the network family (transport, timeout,
    /// malformed payload) that drives a `failed` status transition.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::MalformedResponse(_)
        )
    }
}

/// A specialized `Result` type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_response_uses_generic_message() {
        let err = SearchError::MalformedResponse("missing field `page`".to_string());
        assert_eq!(err.user_message(), MALFORMED_RESPONSE_MESSAGE);
        assert!(err.is_network());
    }

    #[test]
    fn timeout_message_is_surfaced_verbatim() {
        let err = SearchError::Timeout("timeout of 10000ms exceeded".to_string());
        assert_eq!(err.user_message(), "timeout of 10000ms exceeded");
    }

    #[test]
    fn persistence_is_not_a_network_error() {
        let err = SearchError::Persistence("disk full".to_string());
        assert!(!err.is_network());
        assert_eq!(err.user_message(), "Persistence error: disk full");
    }
}
