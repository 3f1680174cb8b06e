//! Domain layer for the search core.
//!
//! Plain data types shared by every other layer, independent of the HTTP
//! client, the async runtime and the storage engine.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`key`]: Request keys identifying `(query, page)` pairs
//! - [`movie`]: The movie model
//! - [`page`]: API responses and tagged page results

pub mod error;
pub mod key;
pub mod movie;
pub mod page;

pub use error::{Result, SearchError};
pub use key::RequestKey;
pub use movie::Movie;
pub use page::{PageResult, SearchResponse};
