//! Parsed SVG documents.
//!
//! A [`Document`] is an immutable snapshot: the source text plus a typed
//! node tree in which every attribute value knows its byte range. Edits never
//! touch a document in place; they splice replacement text into the source
//! and parse the result into a new snapshot.
//!
//! # Architecture
//!
//! ```text
//! markup ──► parse (quick-xml) ──► Document { source, nodes }
//!                                      │
//!                   splices ──► splice ─┴─► new markup ──► parse ──► Document
//! ```
//!
//! Element identities are assigned during parsing, see [`ElementId`].

mod error;
mod namespace;
mod parse;
mod splice;

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use error::ParseError;
pub use namespace::NamespaceIssue;
pub(crate) use splice::Splice;

// ============================================================================
// ElementId
// ============================================================================

/// Stable identity of an element.
///
/// `#<id>` for elements carrying the first occurrence of a non-empty `id`
/// attribute, otherwise the structural path `/svg[0]/g[1]/path[0]` (local
/// name and index among sibling elements). Both forms depend only on the
/// markup, so re-parsing unedited markup yields the same identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub(crate) fn declared(id: &str) -> Self {
        Self(format!("#{id}"))
    }

    pub(crate) fn structural(path: &str) -> Self {
        Self(path.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// A node of the document tree. Non-element nodes only keep their span.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    /// Character data, including CDATA sections and entity references.
    Text(Range<usize>),
    Comment(Range<usize>),
    /// Declarations, processing instructions, doctype.
    Other(Range<usize>),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    id: ElementId,
    /// Structural path, kept even when `id` is declared.
    path: String,
    /// Qualified name as written.
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
    span: Range<usize>,
    /// Byte offset right after the last attribute, where new ones go.
    insert_at: usize,
}

impl Element {
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without namespace prefix (`svg:path` → `path`).
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Attribute by exact qualified name.
    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attr(name).map(Attribute::value)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_elements(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Byte range from `<` of the start tag to `>` of the end tag.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    pub(crate) fn insert_at(&self) -> usize {
        self.insert_at
    }
}

#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    /// Unescaped value.
    value: String,
    /// Range of the raw value between the quotes.
    value_span: Range<usize>,
}

impl Attribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn value_span(&self) -> Range<usize> {
        self.value_span.clone()
    }
}

#[inline]
fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

// ============================================================================
// Document
// ============================================================================

/// Immutable parsed document. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Document {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    source: String,
    nodes: Vec<Node>,
    root: usize,
}

impl Document {
    /// Parse markup into a document.
    pub fn parse(markup: &str) -> Result<Self, ParseError> {
        let (nodes, root) = parse::parse_nodes(markup)?;
        Ok(Self {
            inner: Arc::new(Inner {
                source: markup.to_string(),
                nodes,
                root,
            }),
        })
    }

    /// Serialized markup. Unedited documents serialize to their input.
    pub fn as_str(&self) -> &str {
        &self.inner.source
    }

    pub fn to_markup(&self) -> String {
        self.inner.source.clone()
    }

    /// Raw source text in `range`.
    pub fn slice(&self, range: Range<usize>) -> &str {
        &self.inner.source[range]
    }

    pub fn root(&self) -> &Element {
        match &self.inner.nodes[self.inner.root] {
            Node::Element(el) => el,
            _ => unreachable!("root index always points at an element"),
        }
    }

    /// Top-level nodes (prolog, comments, root element).
    pub fn nodes(&self) -> &[Node] {
        &self.inner.nodes
    }

    /// All elements in document order (pre-order).
    pub fn elements(&self) -> Elements<'_> {
        Elements {
            stack: vec![self.root()],
        }
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements().find(|el| el.id() == id)
    }

    /// Whether two snapshots hold the same markup.
    pub fn same_markup(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.as_str() == other.as_str()
    }
}

/// Pre-order element iterator with an explicit worklist.
pub struct Elements<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Elements<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let el = self.stack.pop()?;
        self.stack.extend(el.child_elements().rev());
        Some(el)
    }
}
