//! Category selections: partial include/exclude toggles keyed by label id

use super::label::LabelId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tri-state toggle submitted for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFlag {
    /// `1`: make sure the post is in the category
    Include,
    /// `0`: make sure the post is not in the category
    Exclude,
    /// Any other value; left alone
    Ignore,
}

impl CategoryFlag {
    /// Parse a raw form value. Anything other than an integer 1 or 0 is `Ignore`.
    pub fn parse(raw: &str) -> Self {
        raw.trim()
            .parse::<i64>()
            .map(Self::from)
            .unwrap_or(CategoryFlag::Ignore)
    }
}

impl From<i64> for CategoryFlag {
    fn from(value: i64) -> Self {
        match value {
            1 => CategoryFlag::Include,
            0 => CategoryFlag::Exclude,
            _ => CategoryFlag::Ignore,
        }
    }
}

/// Desired category toggles for a post.
///
/// Only the mentioned categories are touched by a sync; an empty selection
/// changes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySelection {
    flags: BTreeMap<LabelId, CategoryFlag>,
}

impl CategorySelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw form pairs such as `("<uuid>", "1")`.
    ///
    /// Ids that do not parse can never match a label and are dropped.
    pub fn from_form<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut selection = Self::new();
        for (raw_id, raw_flag) in pairs {
            match raw_id.parse::<LabelId>() {
                Ok(id) => selection.set(id, CategoryFlag::parse(raw_flag)),
                Err(_) => tracing::debug!(id = raw_id, "dropping unparseable category id"),
            }
        }
        selection
    }

    pub fn set(&mut self, id: LabelId, flag: CategoryFlag) {
        self.flags.insert(id, flag);
    }

    pub fn include(mut self, id: LabelId) -> Self {
        self.set(id, CategoryFlag::Include);
        self
    }

    pub fn exclude(mut self, id: LabelId) -> Self {
        self.set(id, CategoryFlag::Exclude);
        self
    }

    pub fn get(&self, id: &LabelId) -> Option<CategoryFlag> {
        self.flags.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LabelId, &CategoryFlag)> {
        self.flags.iter()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl FromIterator<(LabelId, CategoryFlag)> for CategorySelection {
    fn from_iter<I: IntoIterator<Item = (LabelId, CategoryFlag)>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().collect(),
        }
    }
}
