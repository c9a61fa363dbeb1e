//! BlogEngine: the post save lifecycle and label reconciliation

use super::clock::{Clock, SystemClock};
use super::label::{Label, LabelKind};
use super::post::{parse_tag_names, Post, PostId};
use super::selection::{CategoryFlag, CategorySelection};
use super::tagging::Tagging;
use super::validation::{FieldError, PostField, ValidationErrors};
use crate::query::{PostQuery, QueryResult};
use crate::storage::{BlogStore, StorageError, StorageResult};
use chrono_tz::Tz;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur in blog operations
#[derive(Debug, Error)]
pub enum BlogError {
    /// Nothing was written
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The post row is saved but its labels may be half-synced.
    /// Saving the post again with the same desired state repairs them.
    #[error("Post {post_id} was saved but syncing its labels failed: {source}")]
    Reconciliation {
        post_id: PostId,
        #[source]
        source: StorageError,
    },

    #[error("Post not found: {0}")]
    PostNotFound(PostId),
}

/// Result type for blog operations
pub type BlogResult<T> = Result<T, BlogError>;

/// The main blog engine
///
/// Owns the save lifecycle of posts: derive missing fields, validate,
/// persist, then reconcile labels against the post's desired state.
/// Reads go straight to the store.
#[derive(Clone)]
pub struct BlogEngine {
    store: Arc<dyn BlogStore>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
}

impl BlogEngine {
    /// Engine on the wall clock in UTC
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            timezone: chrono_tz::UTC,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Zone used to default a post's year and month
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn store(&self) -> &Arc<dyn BlogStore> {
        &self.store
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    // --- Write ---

    /// Save a post and apply its desired tags and categories.
    ///
    /// Validation failures write nothing. Once the post row is written,
    /// label sync runs as separate store calls; a failure there returns
    /// `BlogError::Reconciliation` and keeps the desired state on `post`
    /// so the save can be retried. Concurrent saves of the same post are
    /// not serialized here.
    pub fn save_post(&self, post: &mut Post) -> BlogResult<()> {
        post.derive_defaults(self.clock.year_month(self.timezone));
        self.validate(post)?;

        let now = self.clock.now();
        let previous = (post.created_at, post.updated_at);
        let created = post.is_new();
        post.created_at.get_or_insert(now);
        post.updated_at = Some(now);

        if let Err(e) = self.store.save_post(post) {
            (post.created_at, post.updated_at) = previous;
            return Err(match e {
                // Another writer took the permalink after our check
                StorageError::Conflict(_) => {
                    ValidationErrors::from(vec![FieldError::taken(PostField::Slug)]).into()
                }
                other => other.into(),
            });
        }

        info!(post = %post.id, slug = ?post.slug, created, "saved post");

        self.reconcile(post)
            .map_err(|source| BlogError::Reconciliation {
                post_id: post.id,
                source,
            })?;

        post.desired_tags = None;
        post.desired_categories = None;
        Ok(())
    }

    /// Delete a post and its label associations. Labels themselves stay.
    pub fn delete_post(&self, id: &PostId) -> BlogResult<bool> {
        let deleted = self.store.delete_post(id)?;
        if deleted {
            info!(post = %id, "deleted post");
        }
        Ok(deleted)
    }

    /// Create a label of the given kind
    pub fn create_label(&self, name: &str, kind: LabelKind) -> BlogResult<Label> {
        let label = Label::new(name.trim(), kind);
        self.store.create_label(&label)?;
        info!(label = %label.id, name = %label.name, %kind, "created label");
        Ok(label)
    }

    // --- Read ---

    pub fn load_post(&self, id: &PostId) -> BlogResult<Post> {
        self.store
            .load_post(id)?
            .ok_or(BlogError::PostNotFound(*id))
    }

    /// Run a query; `total_count` ignores limit and offset
    pub fn find_posts(&self, query: &PostQuery) -> BlogResult<QueryResult> {
        let posts = self.store.find_posts(query)?;
        let total_count = if query.limit.is_none() && query.offset.is_none() {
            posts.len()
        } else {
            self.store.count_posts(query)?
        };
        Ok(QueryResult { posts, total_count })
    }

    /// The post's persisted tag names joined with ", ".
    ///
    /// Memoized on the post until `Post::invalidate_tag_names` is called or
    /// a save syncs its tags.
    pub fn tag_names(&self, post: &mut Post) -> BlogResult<String> {
        if let Some(cached) = post.cached_tag_names() {
            return Ok(cached.to_string());
        }

        let names = if post.is_new() {
            String::new()
        } else {
            self.tags(post)?
                .into_iter()
                .map(|label| label.name)
                .collect::<Vec<_>>()
                .join(", ")
        };
        post.cache_tag_names(names.clone());
        Ok(names)
    }

    pub fn tags(&self, post: &Post) -> BlogResult<Vec<Label>> {
        Ok(self.store.labels_for_post(&post.id, Some(LabelKind::Tag))?)
    }

    pub fn categories(&self, post: &Post) -> BlogResult<Vec<Label>> {
        Ok(self.store.labels_for_post(&post.id, Some(LabelKind::Category))?)
    }

    pub fn labels(&self, kind: Option<LabelKind>) -> BlogResult<Vec<Label>> {
        Ok(self.store.list_labels(kind)?)
    }

    // --- Lifecycle steps ---

    fn validate(&self, post: &Post) -> BlogResult<()> {
        let mut errors = ValidationErrors::from(post.presence_errors());

        if let (Some(slug), Some(year), Some(month)) = (post.slug.as_deref(), post.year, post.month) {
            if !slug.trim().is_empty() && self.store.slug_taken(slug, year, month, Some(&post.id))? {
                errors.push(FieldError::taken(PostField::Slug));
            }
        }

        if !errors.is_empty() {
            debug!(post = %post.id, %errors, "post failed validation");
        }
        Ok(errors.into_result()?)
    }

    fn reconcile(&self, post: &mut Post) -> StorageResult<()> {
        if let Some(text) = post.desired_tags.clone() {
            self.sync_tags(&post.id, &text)?;
            post.invalidate_tag_names();
        }

        if let Some(selection) = &post.desired_categories {
            self.sync_categories(&post.id, selection)?;
        }

        Ok(())
    }

    /// Replace every tag association with the names in `text`
    fn sync_tags(&self, post_id: &PostId, text: &str) -> StorageResult<()> {
        let removed = self.store.delete_taggings(post_id, LabelKind::Tag)?;
        let now = self.clock.now();
        let mut added = 0;

        for name in parse_tag_names(text) {
            let label = self.store.find_or_create_tag(&name)?;
            if label.is_category() {
                warn!(post = %post_id, name = %name, "skipping tag name that belongs to a category");
                continue;
            }
            self.store.create_tagging(&Tagging::new(*post_id, label.id, now))?;
            added += 1;
        }

        debug!(post = %post_id, removed, added, "synced tags");
        Ok(())
    }

    /// Apply include/exclude toggles; unmentioned categories are untouched
    fn sync_categories(&self, post_id: &PostId, selection: &CategorySelection) -> StorageResult<()> {
        for (label_id, flag) in selection.iter() {
            match flag {
                CategoryFlag::Include => {
                    let Some(category) = self.store.find_category(label_id)? else {
                        debug!(post = %post_id, label = %label_id, "ignoring unknown category");
                        continue;
                    };
                    if self.store.tagging_count(post_id, &category.id)? > 0 {
                        continue;
                    }
                    self.store
                        .create_tagging(&Tagging::new(*post_id, category.id, self.clock.now()))?;
                    debug!(post = %post_id, category = %category.name, "added category");
                }
                CategoryFlag::Exclude => {
                    let removed = self.store.delete_tagging(post_id, label_id, LabelKind::Category)?;
                    if removed > 0 {
                        debug!(post = %post_id, label = %label_id, "removed category");
                    }
                }
                CategoryFlag::Ignore => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::FixedClock;
    use crate::storage::{OpenStore, SqliteStore};
    use chrono::{TimeZone, Utc};

    fn create_engine() -> BlogEngine {
        let store = SqliteStore::open_in_memory().unwrap();
        BlogEngine::new(Arc::new(store))
            .with_clock(Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap())))
    }

    #[test]
    fn test_save_derives_and_stamps() {
        let engine = create_engine();
        let mut post = Post::new("Hello World!", "body");
        engine.save_post(&mut post).unwrap();

        assert_eq!(post.slug.as_deref(), Some("hello-world"));
        assert_eq!((post.year, post.month), (Some(2024), Some(3)));
        assert_eq!(post.created_at, Some(Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()));
        assert_eq!(post.created_at, post.updated_at);
    }

    #[test]
    fn test_validation_failure_writes_nothing() {
        let engine = create_engine();
        let mut post = Post::new("", "");

        let errors = match engine.save_post(&mut post) {
            Err(BlogError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other),
        };
        assert!(errors.has(PostField::Title));
        assert!(errors.has(PostField::Slug));
        assert!(errors.has(PostField::Content));
        assert!(!errors.has(PostField::Year));

        assert!(post.is_new());
        assert_eq!(engine.find_posts(&PostQuery::new()).unwrap().total_count, 0);
    }

    #[test]
    fn test_timezone_decides_default_month() {
        let store = SqliteStore::open_in_memory().unwrap();
        let engine = BlogEngine::new(Arc::new(store))
            .with_clock(Arc::new(FixedClock(Utc.with_ymd_and_hms(2023, 12, 31, 23, 30, 0).unwrap())))
            .with_timezone(chrono_tz::Asia::Tokyo);

        let mut post = Post::new("New Year", "body");
        engine.save_post(&mut post).unwrap();
        assert_eq!((post.year, post.month), (Some(2024), Some(1)));
    }

    #[test]
    fn test_load_missing_post() {
        let engine = create_engine();
        let id = PostId::new();
        assert!(matches!(engine.load_post(&id), Err(BlogError::PostNotFound(missing)) if missing == id));
    }

    #[test]
    fn test_desired_state_cleared_after_save() {
        let engine = create_engine();
        let mut post = Post::new("t", "c")
            .with_tags("a")
            .with_categories(CategorySelection::new());
        engine.save_post(&mut post).unwrap();

        assert!(post.desired_tags.is_none());
        assert!(post.desired_categories.is_none());
    }
}
