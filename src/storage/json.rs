//! JSON file-based key/value store.
//!
//! This module provides a simple, human-readable storage implementation using
//! JSON serialization. It uses atomic file writes (write-to-temp + rename) so
//! a crash mid-write never leaves a half-written file behind.
//!
//! # Performance Characteristics
//!
//! - **Read**: O(1) - the whole file is loaded into memory once
//! - **Write**: O(n) - serializes and writes the entire map
//! - **Best for**: a handful of keys holding moderately sized blobs

use crate::domain::error::{Result, SearchError};
use crate::storage::backend::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// JSON storage container format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    /// Version of the container format for future migrations.
    version: u32,

    #[serde(default)]
    items: BTreeMap<String, String>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: 1,
            items: BTreeMap::new(),
        }
    }
}

/// JSON file key/value store.
///
/// All items are kept in memory and the whole file is rewritten on every
/// change. A file that exists but does not parse is treated as empty and is
/// replaced by the next write, so corrupt storage degrades to a cold start.
///
/// # File Format
///
/// ```json
/// {
///   "version": 1,
///   "items": {
///     "persist:root": "{\"version\":1,\"cache\":{}}"
///   }
/// }
/// ```
pub struct JsonFileStore {
    file_path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens (or prepares to create) the store at `file_path`.
    ///
    /// Parent directories are created automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or an
    /// existing file cannot be read.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use reelsearch::storage::{JsonFileStore, KeyValueStore};
    /// use std::path::PathBuf;
    ///
    /// let store = JsonFileStore::open(PathBuf::from("/tmp/reelsearch/state.json"))?;
    /// store.set_item("greeting", "hello")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(file_path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?file_path, "opening JSON store");

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let items = if file_path.exists() {
            Self::load_from_file(&file_path)?
        } else {
            tracing::debug!("no store file yet, starting empty");
            BTreeMap::new()
        };

        tracing::debug!(item_count = items.len(), "JSON store opened");

        Ok(Self {
            file_path,
            items: Mutex::new(items),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load_from_file(path: &Path) -> Result<BTreeMap<String, String>> {
        let contents = std::fs::read_to_string(path)?;
        match serde_json::from_str::<StoreFile>(&contents) {
            Ok(file) => {
                tracing::debug!(version = file.version, items = file.items.len(), "loaded store file");
                Ok(file.items)
            }
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "store file is malformed, starting empty");
                Ok(BTreeMap::new())
            }
        }
    }

    fn items(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>> {
        self.items
            .lock()
            .map_err(|e| SearchError::Persistence(format!("store lock poisoned: {e}")))
    }

    /// Writes `items` to a temporary file, then renames it over the target.
    fn save_to_file(&self, items: &BTreeMap<String, String>) -> Result<()> {
        let file = StoreFile {
            version: 1,
            items: items.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| SearchError::Persistence(format!("failed to serialize store: {e}")))?;

        let tmp_path = self.file_path.with_extension("tmp");
        tracing::trace!(tmp_path = ?tmp_path, "writing to temporary file");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.file_path)?;

        tracing::debug!(path = ?self.file_path, "store saved");
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _span = tracing::debug_span!("json_set_item", key = %key, bytes = value.len()).entered();

        let mut items = self.items()?;
        if items.get(key).is_some_and(|current| current == value) {
            tracing::trace!("value unchanged, skipping save");
            return Ok(());
        }
        // Memory only moves forward once the file has.
        let mut next = items.clone();
        next.insert(key.to_string(), value.to_string());
        self.save_to_file(&next)?;
        *items = next;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items()?;
        if !items.contains_key(key) {
            return Ok(());
        }
        let mut next = items.clone();
        next.remove(key);
        self.save_to_file(&next)?;
        *items = next;
        Ok(())
    }
}

impl std::fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}
