//! Labels: the shared tag/category vocabulary

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(Uuid);

impl LabelId {
    /// Create a new random LabelId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a LabelId from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LabelId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LabelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LabelId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Role of a label, fixed when the label is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    /// Free-form tag (`is_category = false`)
    #[default]
    Tag,
    /// Curated category (`is_category = true`)
    Category,
}

impl LabelKind {
    pub fn is_category(self) -> bool {
        matches!(self, LabelKind::Category)
    }

    pub fn from_is_category(is_category: bool) -> Self {
        if is_category {
            LabelKind::Category
        } else {
            LabelKind::Tag
        }
    }
}

impl std::fmt::Display for LabelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelKind::Tag => write!(f, "tag"),
            LabelKind::Category => write!(f, "category"),
        }
    }
}

/// A named label; names are unique across both kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
    pub kind: LabelKind,
}

impl Label {
    pub fn new(name: impl Into<String>, kind: LabelKind) -> Self {
        Self {
            id: LabelId::new(),
            name: name.into(),
            kind,
        }
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self::new(name, LabelKind::Tag)
    }

    pub fn category(name: impl Into<String>) -> Self {
        Self::new(name, LabelKind::Category)
    }

    pub fn is_category(&self) -> bool {
        self.kind.is_category()
    }
}
