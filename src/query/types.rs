//! Query types and result structures

use crate::blog::Post;

/// Result ordering for post queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
    /// Creation time, descending
    #[default]
    NewestFirst,
    /// Creation time, ascending
    OldestFirst,
    /// Title, ascending
    Title,
}

/// Result of a post query
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Posts matching the query
    pub posts: Vec<Post>,
    /// Total count (may differ from posts.len() if limit applied)
    pub total_count: usize,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self {
            posts: Vec::new(),
            total_count: 0,
        }
    }

    pub fn from_posts(posts: Vec<Post>) -> Self {
        let total_count = posts.len();
        Self { posts, total_count }
    }

    /// Slugs in result order
    pub fn slugs(&self) -> Vec<&str> {
        self.posts
            .iter()
            .filter_map(|p| p.slug.as_deref())
            .collect()
    }
}
