//! Partial-state persistence transform.
//!
//! Only the cache survives a restart. [`project`] cuts a full [`SearchState`]
//! down to the [`PersistedShape`], and [`hydrate`] merges a persisted shape
//! back into a default state. Both are pure and know nothing about the storage
//! engine; [`encode`] / [`decode`] handle the blob format.

use crate::app::{CacheStore, SearchState};
use crate::domain::error::{Result, SearchError};
use serde::{Deserialize, Serialize};

/// Fixed storage key the blob lives under.
pub const ROOT_KEY: &str = "persist:root";

/// Current blob format version.
pub const FORMAT_VERSION: u32 = 1;

const fn default_version() -> u32 {
    FORMAT_VERSION
}

/// The persisted subset of the search state.
///
/// ```json
/// { "version": 1, "cache": { "dune-1": { "results": [], "page": 1, "total_pages": 1, "query": "dune" } } }
/// ```
///
/// Blobs without a `version` field are read as version 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedShape {
    #[serde(default = "default_version")]
    pub version: u32,
    pub cache: CacheStore,
}

/// Extracts the persisted subset of `state`.
#[must_use]
pub fn project(state: &SearchState) -> PersistedShape {
    PersistedShape {
        version: FORMAT_VERSION,
        cache: state.cache.clone(),
    }
}

/// Rebuilds a full state from an optional persisted shape.
///
/// With a shape, its cache replaces the cache of `defaults` and every other
/// field keeps its default. Without one, `defaults` is returned unchanged.
#[must_use]
pub fn hydrate(persisted: Option<PersistedShape>, defaults: SearchState) -> SearchState {
    match persisted {
        Some(shape) => SearchState {
            cache: shape.cache,
            ..defaults
        },
        None => defaults,
    }
}

/// Serializes a shape into the stored blob.
///
/// # Errors
///
/// Returns [`SearchError::Persistence`] if serialization fails.
pub fn encode(shape: &PersistedShape) -> Result<String> {
    serde_json::to_string(shape)
        .map_err(|e| SearchError::Persistence(format!("failed to encode persisted state: {e}")))
}

/// Parses a stored blob.
///
/// # Errors
///
/// Returns [`SearchError::Persistence`] if the blob is not a valid shape or
/// was written by a newer format version.
pub fn decode(blob: &str) -> Result<PersistedShape> {
    let shape: PersistedShape = serde_json::from_str(blob)
        .map_err(|e| SearchError::Persistence(format!("malformed persisted state: {e}")))?;

    if shape.version > FORMAT_VERSION {
        return Err(SearchError::Persistence(format!(
            "unsupported persisted state version {}",
            shape.version
        )));
    }
    Ok(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::RequestStatus;
    use crate::domain::{Movie, PageResult, RequestKey};

    fn cached_state() -> SearchState {
        let mut state = SearchState::default();
        let page = PageResult {
            results: vec![Movie::new(1, "X", "2010-01-01", None)],
            page: 1,
            total_pages: 4,
            query: "x".to_string(),
        };
        state.cache.insert(RequestKey::new("x", 1), page.clone());
        state.results = page.results;
        state.status = RequestStatus::Succeeded;
        state.current_page = 1;
        state.total_pages = 4;
        state.query = "x".to_string();
        state
    }

    #[test]
    fn project_keeps_only_the_cache() {
        let blob = encode(&project(&cached_state())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&blob).unwrap();

        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert!(object.contains_key("cache"));
        assert_eq!(object["version"], 1);
        assert!(value["cache"]["x-1"].is_object());
    }

    #[test]
    fn hydrate_merges_cache_into_defaults() {
        let restored = hydrate(Some(project(&cached_state())), SearchState::default());

        assert_eq!(restored.status, RequestStatus::Idle);
        assert!(restored.results.is_empty());
        assert_eq!((restored.current_page, restored.total_pages), (1, 1));
        assert!(restored.cache.contains(&RequestKey::new("x", 1)));
    }

    #[test]
    fn hydrate_without_shape_returns_defaults() {
        assert_eq!(hydrate(None, SearchState::default()), SearchState::default());
    }

    #[test]
    fn decode_accepts_unversioned_cache_only_blob() {
        let blob = r#"{"cache": {"x-1": {"results": [], "page": 1, "total_pages": 1, "query": "x"}}}"#;
        let shape = decode(blob).unwrap();
        assert_eq!(shape.version, 1);
        assert_eq!(shape.cache.len(), 1);
    }

    #[test]
    fn decode_rejects_malformed_and_future_blobs() {
        assert!(decode("not json").is_err());
        assert!(decode(r#"{"cache": {"x-1": {"page": "one"}}}"#).is_err());
        assert!(decode(r#"{"version": 99, "cache": {}}"#).is_err());
    }
}
