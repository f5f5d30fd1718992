//! Edit application errors.

use thiserror::Error;

use crate::color::ColorKey;
use crate::discover::Site;
use crate::document::{ElementId, ParseError};

/// An edit names something the current document does not have.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidReference {
    #[error("no color group `{0}` in this document")]
    UnknownColor(ColorKey),

    #[error("no gradient `#{0}` in this document")]
    UnknownGradient(String),

    #[error("gradient `#{gradient}` has no stop {index}")]
    UnknownStop { gradient: String, index: usize },
}

/// Why an [`EditRequest`](super::EditRequest) was rejected as a whole.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error(transparent)]
    InvalidReference(#[from] InvalidReference),

    #[error("`{value}` is not a valid value for {site}")]
    InvalidColor { value: String, site: Site },

    #[error("stop opacity {0} is outside 0..=1")]
    InvalidOpacity(f32),

    #[error("two edits rewrite the same value on {element}")]
    Conflict { element: ElementId },

    #[error("edited markup no longer parses")]
    Reparse(#[source] ParseError),
}
