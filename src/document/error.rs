//! Document parsing errors.

use thiserror::Error;

/// Markup that cannot be turned into a [`Document`](super::Document).
///
/// Parsing fails as a whole: there is no partial document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed markup at byte {position}: {message}")]
    Malformed { position: usize, message: String },

    #[error("malformed attribute at byte {position}: {message}")]
    Attribute { position: usize, message: String },

    #[error("document has no root element")]
    NoRoot,

    #[error("second root element at byte {position}")]
    MultipleRoots { position: usize },

    #[error("element `<{name}>` is never closed")]
    Unclosed { name: String },

    #[error("root element is `<{name}>`, expected `<svg>`")]
    NotSvg { name: String },
}
