//! Storage backend abstraction.
//!
//! This module defines the [`KeyValueStore`] trait, the boundary between the
//! persistence adapter and whatever durable engine the host application
//! provides. The adapter only ever stores one string blob under a fixed root
//! key, so the trait is a minimal string key/value interface rather than a
//! generic ORM.

use crate::domain::error::Result;

/// Durable string key/value storage.
///
/// Implementations must be usable from several threads; the persister writes
/// from a blocking worker thread while the session may read at startup.
///
/// # Implementations
///
/// - [`JsonFileStore`](super::JsonFileStore): one JSON file with atomic writes
/// - [`MemoryStore`](super::MemoryStore): process memory only
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `Ok(None)` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. Backends may have kept the old
    /// value in that case.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn remove_item(&self, key: &str) -> Result<()>;
}
