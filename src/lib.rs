//! svgtint - color discovery, recoloring, and preview for SVG icons.
//!
//! # Module Structure
//!
//! ```text
//! svgtint/
//! ├── color/      # ColorKey, token grammar, named colors, style scanner
//! ├── document/   # byte-preserving SVG tree, element identities, splicing
//! ├── discover/   # document → color map + gradient table
//! ├── apply/      # document + edit request → new document
//! ├── preview/    # hover/isolation state machine and directives
//! ├── session     # load / apply / reset over one document
//! ├── config/     # svgtint.toml
//! └── logger      # log! / debug!
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut session = Session::load(markup)?;
//! let red = "#f00".parse::<ColorKey>()?;
//! session.apply(&EditRequest::new().recolor(red, "navy"))?;
//! println!("{}", session.markup());
//! ```

pub mod apply;
pub mod color;
pub mod config;
pub mod discover;
pub mod document;
pub mod logger;
pub mod preview;
pub mod session;

pub use apply::{EditError, EditRequest, InvalidReference, StopEdit, apply};
pub use color::{ColorKey, Paint, PropertyKind, Rgba, canonicalize};
pub use discover::{
    ColorGroup, ElementColorMap, ElementColorRef, GradientDefinition, GradientKind, GradientStop,
    GradientTable, Property, Site, discover,
};
pub use document::{Document, ElementId, NamespaceIssue, ParseError};
pub use preview::{
    DirectiveSet, Emphasis, IsolationTarget, LatestDirectives, PreviewDirective, PreviewEvent,
    PreviewOptions, PreviewState, StopRef, directives,
};
pub use session::Session;
