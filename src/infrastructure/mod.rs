//! Infrastructure layer for filesystem and environment interactions.
//!
//! Resolves where persisted state and span files live on the host.

pub mod paths;

pub use paths::{data_dir, default_data_dir, expand_tilde, expand_tilde_with};
