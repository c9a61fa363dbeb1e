//! Query system for blog posts
//!
//! Scopes describe which posts to read and in what order; stores
//! execute them.

mod scope;
mod types;

pub use scope::{LabelScope, PostQuery};
pub use types::{PostOrder, QueryResult};
