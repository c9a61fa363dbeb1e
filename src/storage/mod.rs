//! Storage backends for blog posts and labels
//!
//! Backends implement the `BlogStore` trait. The primary implementation is
//! `SqliteStore` for persistent storage.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{BlogStore, OpenStore, StorageError, StorageResult};
