//! Validation failures reported before a post is persisted

use serde::Serialize;

/// Post fields that carry validation rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostField {
    Title,
    Slug,
    Year,
    Month,
    Content,
}

impl std::fmt::Display for PostField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PostField::Title => "title",
            PostField::Slug => "slug",
            PostField::Year => "year",
            PostField::Month => "month",
            PostField::Content => "content",
        };
        f.write_str(name)
    }
}

/// What is wrong with a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldProblem {
    /// Missing or whitespace-only
    Blank,
    /// Another post already uses this slug in the same year and month
    Taken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: PostField,
    pub problem: FieldProblem,
}

impl FieldError {
    pub fn blank(field: PostField) -> Self {
        Self {
            field,
            problem: FieldProblem::Blank,
        }
    }

    pub fn taken(field: PostField) -> Self {
        Self {
            field,
            problem: FieldProblem::Taken,
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.problem {
            FieldProblem::Blank => write!(f, "{} can't be blank", self.field),
            FieldProblem::Taken => write!(f, "{} has already been taken", self.field),
        }
    }
}

/// Every rule a post violated, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// True if `field` failed for any reason
    pub fn has(&self, field: PostField) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        f.write_str(&parts.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}
