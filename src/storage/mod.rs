//! Persistence for the search cache.
//!
//! The cache is the only part of the search state that outlives the process.
//! Everything here sits behind the [`KeyValueStore`] boundary so hosts can
//! bring their own durable engine.
//!
//! # Modules
//!
//! - `backend`: the string key/value trait the adapter writes through
//! - `json`: single-file JSON store with atomic writes
//! - `memory`: in-process store
//! - `transform`: pure projection/hydration of the persisted subset
//! - `persister`: startup load and debounced background saves

pub mod backend;
pub mod json;
pub mod memory;
pub mod persister;
pub mod transform;

pub use backend::KeyValueStore;
pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use persister::{
    load_persisted, rehydrate, save_persisted, Persister, DEFAULT_PERSIST_DEBOUNCE,
};
pub use transform::{decode, encode, hydrate, project, PersistedShape, FORMAT_VERSION, ROOT_KEY};
