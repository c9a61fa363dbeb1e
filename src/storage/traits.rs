//! Storage trait definitions

use crate::blog::{Label, LabelId, LabelKind, Post, PostId, Tagging};
use crate::query::PostQuery;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    /// A uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid stored id: {0}")]
    InvalidId(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for post/label storage backends
///
/// Implementations must be thread-safe (Send + Sync). Individual calls are
/// atomic; sequences of calls are not, so callers that need a multi-step
/// change to be all-or-nothing must serialize it themselves.
pub trait BlogStore: Send + Sync {
    // === Post Operations ===

    /// Save a post (insert or update by id).
    ///
    /// Fails with `Conflict` if another post holds the same
    /// (slug, year, month).
    fn save_post(&self, post: &Post) -> StorageResult<()>;

    /// Load a post by ID
    fn load_post(&self, id: &PostId) -> StorageResult<Option<Post>>;

    /// Delete a post and its taggings
    fn delete_post(&self, id: &PostId) -> StorageResult<bool>;

    /// Whether a post other than `excluding` uses this slug in this year and month
    fn slug_taken(
        &self,
        slug: &str,
        year: i32,
        month: u32,
        excluding: Option<&PostId>,
    ) -> StorageResult<bool>;

    /// Posts matching the query, in the query's order
    fn find_posts(&self, query: &PostQuery) -> StorageResult<Vec<Post>>;

    /// Number of posts matching the query, ignoring limit and offset
    fn count_posts(&self, query: &PostQuery) -> StorageResult<usize>;

    // === Label Operations ===

    /// Insert a label. Fails with `Conflict` if the name is taken.
    fn create_label(&self, label: &Label) -> StorageResult<()>;

    fn load_label(&self, id: &LabelId) -> StorageResult<Option<Label>>;

    fn find_label_by_name(&self, name: &str) -> StorageResult<Option<Label>>;

    /// The label with this id, only if it is a category
    fn find_category(&self, id: &LabelId) -> StorageResult<Option<Label>>;

    /// Labels by name, optionally of one kind
    fn list_labels(&self, kind: Option<LabelKind>) -> StorageResult<Vec<Label>>;

    /// Find the label called `name`, creating it as a tag if absent.
    ///
    /// A returned label may be a category when that name is already one.
    /// If a concurrent writer creates the name between lookup and insert,
    /// the existing row is returned.
    fn find_or_create_tag(&self, name: &str) -> StorageResult<Label> {
        if let Some(label) = self.find_label_by_name(name)? {
            return Ok(label);
        }

        let label = Label::tag(name);
        match self.create_label(&label) {
            Ok(()) => Ok(label),
            Err(StorageError::Conflict(reason)) => {
                tracing::warn!(name, %reason, "label created concurrently, using existing row");
                self.find_label_by_name(name)?
                    .ok_or(StorageError::Conflict(reason))
            }
            Err(e) => Err(e),
        }
    }

    // === Tagging Operations ===

    fn create_tagging(&self, tagging: &Tagging) -> StorageResult<()>;

    /// Number of association rows between the post and the label
    fn tagging_count(&self, post_id: &PostId, label_id: &LabelId) -> StorageResult<usize>;

    /// Delete every tagging of the post whose label is of `kind`
    fn delete_taggings(&self, post_id: &PostId, kind: LabelKind) -> StorageResult<usize>;

    /// Delete the post's taggings to `label_id`, only if that label is of `kind`
    fn delete_tagging(
        &self,
        post_id: &PostId,
        label_id: &LabelId,
        kind: LabelKind,
    ) -> StorageResult<usize>;

    /// Labels associated with the post, optionally of one kind, in the order
    /// the post first gained them
    fn labels_for_post(&self, post_id: &PostId, kind: Option<LabelKind>) -> StorageResult<Vec<Label>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: BlogStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
