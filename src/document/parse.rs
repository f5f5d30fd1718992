//! Markup → node tree, on top of the quick-xml pull reader.
//!
//! quick-xml does the tokenizing and well-formedness checks; this module
//! only tracks byte offsets so that each attribute value can be located in
//! the source text.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rustc_hash::FxHashSet;

use super::{Attribute, Element, ElementId, Node, ParseError, local_name};

/// Element under construction plus the number of element children seen.
struct Open {
    element: Element,
    element_children: usize,
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Open>,
    nodes: Vec<Node>,
    root: Option<usize>,
    seen_ids: FxHashSet<String>,
}

impl TreeBuilder {
    /// Structural path for an element opened now, ignoring any `id`.
    fn structural_path(&self, local: &str) -> String {
        match self.stack.last() {
            Some(parent) => format!(
                "{}/{local}[{}]",
                parent.element.path, parent.element_children
            ),
            None => format!("/{local}[{}]", usize::from(self.root.is_some())),
        }
    }

    /// First occurrence of a non-empty `id` wins; everything else is a path.
    fn identity(&mut self, path: &str, declared: Option<&str>) -> ElementId {
        match declared.filter(|id| !id.is_empty()) {
            Some(id) if self.seen_ids.insert(id.to_string()) => ElementId::declared(id),
            _ => ElementId::structural(path),
        }
    }

    fn attach(&mut self, node: Node, position: usize) -> Result<(), ParseError> {
        let is_element = matches!(node, Node::Element(_));
        if let Some(parent) = self.stack.last_mut() {
            if is_element {
                parent.element_children += 1;
            }
            parent.element.children.push(node);
            return Ok(());
        }

        if is_element {
            if self.root.is_some() {
                return Err(ParseError::MultipleRoots { position });
            }
            self.root = Some(self.nodes.len());
        }
        self.nodes.push(node);
        Ok(())
    }
}

/// Parse markup into top-level nodes and the index of the root element.
pub(super) fn parse_nodes(src: &str) -> Result<(Vec<Node>, usize), ParseError> {
    let mut reader = Reader::from_str(src);
    let mut builder = TreeBuilder::default();

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|err| ParseError::Malformed {
            position: reader.error_position() as usize,
            message: err.to_string(),
        })?;
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                let element = open_element(src, start, &e, &mut builder)?;
                builder.stack.push(Open {
                    element,
                    element_children: 0,
                });
            }
            Event::Empty(e) => {
                let mut element = open_element(src, start, &e, &mut builder)?;
                element.span = start..end;
                builder.attach(Node::Element(element), start)?;
            }
            Event::End(_) => {
                let Some(open) = builder.stack.pop() else {
                    return Err(ParseError::Malformed {
                        position: start,
                        message: "unexpected end tag".to_string(),
                    });
                };
                let mut element = open.element;
                element.span.end = end;
                builder.attach(Node::Element(element), start)?;
            }
            Event::Comment(_) => builder.attach(Node::Comment(start..end), start)?,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {
                builder.attach(Node::Other(start..end), start)?;
            }
            Event::Eof => break,
            // Text, CDATA, and entity references.
            _ => builder.attach(Node::Text(start..end), start)?,
        }
    }

    if let Some(open) = builder.stack.pop() {
        return Err(ParseError::Unclosed {
            name: open.element.name,
        });
    }

    let root = builder.root.ok_or(ParseError::NoRoot)?;
    if let Node::Element(el) = &builder.nodes[root]
        && el.local_name() != "svg"
    {
        return Err(ParseError::NotSvg {
            name: el.name.clone(),
        });
    }

    Ok((builder.nodes, root))
}

/// Build an element from a start tag beginning at `start` (the `<`).
fn open_element(
    src: &str,
    start: usize,
    e: &BytesStart<'_>,
    builder: &mut TreeBuilder,
) -> Result<Element, ParseError> {
    let raw: &[u8] = e;
    let content_start = start + 1;
    if src.as_bytes().get(content_start..content_start + raw.len()) != Some(raw) {
        return Err(ParseError::Malformed {
            position: start,
            message: "start tag does not match reader offset".to_string(),
        });
    }

    let name_len = e.name().as_ref().len();
    let name = src[content_start..content_start + name_len].to_string();
    let (attributes, insert_at) = read_attributes(src, content_start, name_len, e)?;

    let local = local_name(&name).to_string();
    let declared = attributes
        .iter()
        .find(|a| a.name == "id")
        .map(|a| a.value.trim().to_string());
    let path = builder.structural_path(&local);
    let id = builder.identity(&path, declared.as_deref());

    Ok(Element {
        id,
        path,
        name,
        attributes,
        children: Vec::new(),
        span: start..start,
        insert_at,
    })
}

/// Locate every attribute of a start tag in the source.
///
/// Returns the attributes and the offset right after the last one.
fn read_attributes(
    src: &str,
    content_start: usize,
    name_len: usize,
    e: &BytesStart<'_>,
) -> Result<(Vec<Attribute>, usize), ParseError> {
    let content: &[u8] = e;
    let mut cursor = name_len;
    let mut attributes = Vec::new();

    let error = |at: usize, message: String| ParseError::Attribute {
        position: content_start + at,
        message,
    };

    for attr in e.attributes() {
        let attr = attr.map_err(|err| error(cursor, err.to_string()))?;
        let key = attr.key.as_ref();

        cursor = skip_whitespace(content, cursor);
        if !content[cursor..].starts_with(key) {
            return Err(error(cursor, "attribute out of sequence".to_string()));
        }
        let name_start = cursor;
        cursor = skip_whitespace(content, cursor + key.len());
        if content.get(cursor) != Some(&b'=') {
            return Err(error(cursor, "expected `=`".to_string()));
        }
        cursor = skip_whitespace(content, cursor + 1);
        let quote = match content.get(cursor) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => return Err(error(cursor, "expected quoted value".to_string())),
        };
        let value_start = cursor + 1;
        let value_end = value_start + attr.value.len();
        if content.get(value_end) != Some(&quote) {
            return Err(error(value_end, "unterminated value".to_string()));
        }
        cursor = value_end + 1;

        let raw = &src[content_start + value_start..content_start + value_end];
        let value = match quick_xml::escape::unescape(raw) {
            Ok(Cow::Borrowed(v)) => v.to_string(),
            Ok(Cow::Owned(v)) => v,
            // Unknown entities are kept verbatim.
            Err(_) => raw.to_string(),
        };

        attributes.push(Attribute {
            name: src[content_start + name_start..content_start + name_start + key.len()]
                .to_string(),
            value,
            value_span: content_start + value_start..content_start + value_end,
        });
    }

    Ok((attributes, content_start + cursor))
}

#[inline]
fn skip_whitespace(bytes: &[u8], mut at: usize) -> usize {
    while bytes.get(at).is_some_and(u8::is_ascii_whitespace) {
        at += 1;
    }
    at
}
