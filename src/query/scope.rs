//! Composable read scopes over posts

use super::types::PostOrder;
use crate::blog::LabelKind;

/// A filter description over posts.
///
/// Every scope narrows the result set; scopes combine conjunctively and in
/// any order. Nothing is read until the query is handed to a store.
///
/// ```
/// use blogpost::PostQuery;
///
/// let query = PostQuery::new().published().for_year(2024).tagged_with("rust");
/// assert_eq!(query.year, Some(2024));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    /// Restrict by publication state
    pub published: Option<bool>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// Label requirements; the post must carry every one
    pub labels: Vec<LabelScope>,
    pub order: PostOrder,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Requires association with a label of the given name and kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelScope {
    pub name: String,
    pub kind: LabelKind,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self::ordered_by(PostOrder::default())
    }
}

impl PostQuery {
    /// All posts, newest first
    pub fn new() -> Self {
        Self::default()
    }

    /// All posts in the given order
    pub fn ordered_by(order: PostOrder) -> Self {
        Self {
            published: None,
            year: None,
            month: None,
            labels: Vec::new(),
            order,
            limit: None,
            offset: None,
        }
    }

    /// Only posts with `is_published = true`
    pub fn published(mut self) -> Self {
        self.published = Some(true);
        self
    }

    /// Only posts with `is_published = false`
    pub fn drafts(mut self) -> Self {
        self.published = Some(false);
        self
    }

    pub fn for_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn for_month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    /// Only posts tagged with exactly `name` (tags, not categories)
    pub fn tagged_with(mut self, name: impl Into<String>) -> Self {
        self.labels.push(LabelScope {
            name: name.into(),
            kind: LabelKind::Tag,
        });
        self
    }

    /// Only posts in the category named exactly `name`
    pub fn categorized_as(mut self, name: impl Into<String>) -> Self {
        self.labels.push(LabelScope {
            name: name.into(),
            kind: LabelKind::Category,
        });
        self
    }

    /// Replace the ordering
    pub fn reorder(mut self, order: PostOrder) -> Self {
        self.order = order;
        self
    }

    /// Limit results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip results (for pagination)
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The same filters without pagination, for counting
    pub fn unpaged(&self) -> Self {
        Self {
            limit: None,
            offset: None,
            ..self.clone()
        }
    }
}
