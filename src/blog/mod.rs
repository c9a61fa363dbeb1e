//! Core blog data structures and the post lifecycle

mod clock;
mod engine;
mod label;
mod post;
mod selection;
mod tagging;
mod validation;


pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{BlogEngine, BlogError, BlogResult};
pub use label::{Label, LabelId, LabelKind};
pub use post::{parse_tag_names, slugify, Post, PostId};
pub use selection::{CategoryFlag, CategorySelection};
pub use tagging::Tagging;
pub use validation::{FieldError, FieldProblem, PostField, ValidationErrors};
