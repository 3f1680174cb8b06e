//! Cache store mapping request keys to page results.
//!
//! The store is append-only: once a key holds a page, later inserts for the
//! same key are ignored. The only way to drop entries is [`CacheStore::clear`].
//! There is no eviction, so the map grows with every distinct `(query, page)`
//! fetched until the user clears it.

use crate::domain::{PageResult, RequestKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request key → page result map.
///
/// Backed by a `BTreeMap` so its serialized form is stable, which lets the
/// persister skip writes when nothing changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheStore {
    entries: BTreeMap<RequestKey, PageResult>,
}

impl CacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &RequestKey) -> Option<&PageResult> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &RequestKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Stores `page` under `key` unless the key is already present.
    ///
    /// Returns `true` when the page was inserted.
    pub fn insert(&mut self, key: RequestKey, page: PageResult) -> bool {
        use std::collections::btree_map::Entry;

        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(page);
                true
            }
            Entry::Occupied(slot) => {
                tracing::trace!(key = %slot.key(), "cache entry already present, keeping original");
                false
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RequestKey> {
        self.entries.keys()
    }
}
