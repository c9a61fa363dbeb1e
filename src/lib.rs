//! Blogpost: blog posts with reconciled tags and categories
//!
//! Posts carry two kinds of labels drawn from one shared vocabulary:
//! free-form tags and curated categories. Saving a post reconciles its
//! label associations against the desired state it carries, and a set of
//! composable scopes lists posts by publication state, date and label.
//!
//! # Core Concepts
//!
//! - **Posts**: title, content and a (slug, year, month) permalink
//! - **Labels**: uniquely named tags or categories, shared across posts
//! - **Taggings**: post/label associations owned by the post
//!
//! # Example
//!
//! ```
//! use blogpost::{BlogEngine, OpenStore, Post, PostQuery, SqliteStore};
//! use std::sync::Arc;
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! let engine = BlogEngine::new(Arc::new(store));
//!
//! let mut post = Post::new("Hello World!", "First words").published().with_tags("intro, meta");
//! engine.save_post(&mut post).unwrap();
//! assert_eq!(post.slug.as_deref(), Some("hello-world"));
//!
//! let found = engine.find_posts(&PostQuery::new().published().tagged_with("intro")).unwrap();
//! assert_eq!(found.total_count, 1);
//! ```

mod blog;
pub mod config;
pub mod query;
pub mod storage;

pub use blog::{
    parse_tag_names, slugify, BlogEngine, BlogError, BlogResult, CategoryFlag, CategorySelection,
    Clock, FieldError, FieldProblem, FixedClock, Label, LabelId, LabelKind, Post, PostField, PostId,
    SystemClock, Tagging, ValidationErrors,
};
pub use config::{Config, ConfigError};
pub use query::{LabelScope, PostOrder, PostQuery, QueryResult};
pub use storage::{BlogStore, OpenStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
