//! Post representation and the field derivation that runs before validation

use super::selection::CategorySelection;
use super::validation::{FieldError, PostField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(Uuid);

impl PostId {
    /// Create a new random PostId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a PostId from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A blog post
///
/// `slug`, `year` and `month` are filled in on save when absent.
/// `desired_tags` and `desired_categories` are never persisted: they carry
/// the caller's requested label state into the next save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub slug: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub content: String,
    pub is_published: bool,
    /// Set on first save
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    /// Comma separated tag names to apply on save. `None` leaves tags alone.
    #[serde(skip)]
    pub desired_tags: Option<String>,
    /// Category toggles to apply on save. `None` leaves categories alone.
    #[serde(skip)]
    pub desired_categories: Option<CategorySelection>,

    #[serde(skip)]
    tag_names_cache: Option<String>,
}

impl Post {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: PostId::new(),
            title: title.into(),
            slug: None,
            year: None,
            month: None,
            content: content.into(),
            is_published: false,
            created_at: None,
            updated_at: None,
            desired_tags: None,
            desired_categories: None,
            tag_names_cache: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_date(mut self, year: i32, month: u32) -> Self {
        self.year = Some(year);
        self.month = Some(month);
        self
    }

    pub fn published(mut self) -> Self {
        self.is_published = true;
        self
    }

    pub fn with_tags(mut self, names: impl Into<String>) -> Self {
        self.desired_tags = Some(names.into());
        self
    }

    pub fn with_categories(mut self, selection: CategorySelection) -> Self {
        self.desired_categories = Some(selection);
        self
    }

    /// True until the post has been saved once
    pub fn is_new(&self) -> bool {
        self.created_at.is_none()
    }

    /// Fill in slug, year and month where absent. Never overwrites a value;
    /// a blank slug stays blank and fails validation.
    pub fn derive_defaults(&mut self, (year, month): (i32, u32)) {
        if self.slug.is_none() {
            let derived = slugify(&self.title);
            self.slug = (!derived.is_empty()).then_some(derived);
        }
        self.year.get_or_insert(year);
        self.month.get_or_insert(month);
    }

    /// Required-field violations, in field order
    pub fn presence_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::blank(PostField::Title));
        }
        if is_blank(self.slug.as_deref()) {
            errors.push(FieldError::blank(PostField::Slug));
        }
        if self.year.is_none() {
            errors.push(FieldError::blank(PostField::Year));
        }
        if self.month.is_none() {
            errors.push(FieldError::blank(PostField::Month));
        }
        if self.content.trim().is_empty() {
            errors.push(FieldError::blank(PostField::Content));
        }
        errors
    }

    /// Memoized tag names, if computed since the last invalidation
    pub fn cached_tag_names(&self) -> Option<&str> {
        self.tag_names_cache.as_deref()
    }

    pub(crate) fn cache_tag_names(&mut self, names: String) {
        self.tag_names_cache = Some(names);
    }

    /// Drop the memoized tag names so the next read recomputes them
    pub fn invalidate_tag_names(&mut self) {
        self.tag_names_cache = None;
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |s| s.trim().is_empty())
}

/// URL-safe form of `text`: lowercase, words joined by `-`.
///
/// Whitespace, `-` and `_` separate words; other punctuation is dropped.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Split comma separated tag text into trimmed, distinct, non-empty names.
/// First occurrence wins the position.
pub fn parse_tag_names(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(*name))
        .map(String::from)
        .collect()
}
