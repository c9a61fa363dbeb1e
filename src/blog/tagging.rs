//! Tagging: the join record between a post and a label

use super::label::LabelId;
use super::post::PostId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Links one post to one label.
///
/// Has no identity beyond the (post, label) pair. The role of the
/// association is the role of its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tagging {
    pub post_id: PostId,
    pub label_id: LabelId,
    pub created_at: DateTime<Utc>,
}

impl Tagging {
    pub fn new(post_id: PostId, label_id: LabelId, created_at: DateTime<Utc>) -> Self {
        Self {
            post_id,
            label_id,
            created_at,
        }
    }
}
