//! Byte-range splicing: the serializer for edited documents.
//!
//! Everything outside the spliced ranges is copied verbatim, which is what
//! keeps attribute order, whitespace, comments, and namespace declarations
//! intact.

use std::ops::Range;

use super::{Document, ParseError};

/// Replace `range` of the source with `text`. Empty ranges insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Splice {
    pub range: Range<usize>,
    pub text: String,
}

impl Splice {
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at..at, text)
    }
}

/// Apply non-overlapping splices, sorted by start offset.
pub(crate) fn splice(source: &str, splices: &[Splice]) -> String {
    let extra: usize = splices.iter().map(|s| s.text.len()).sum();
    let mut out = String::with_capacity(source.len() + extra);
    let mut cursor = 0;
    for s in splices {
        out.push_str(&source[cursor..s.range.start]);
        out.push_str(&s.text);
        cursor = s.range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

impl Document {
    /// New snapshot with `splices` applied. The receiver is left untouched.
    ///
    /// Callers sort splices and rule out overlaps beforehand.
    pub(crate) fn with_splices(&self, splices: &[Splice]) -> Result<Document, ParseError> {
        if splices.is_empty() {
            return Ok(self.clone());
        }
        Document::parse(&splice(self.as_str(), splices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splice_replace_and_insert() {
        let src = r#"<rect fill="red"/>"#;
        let out = splice(
            src,
            &[
                Splice::replace(12..15, "#0000ff"),
                Splice::insert(16, r##" stroke="#000""##),
            ],
        );
        assert_eq!(out, r##"<rect fill="#0000ff" stroke="#000"/>"##);
    }

    #[test]
    fn test_splice_nothing() {
        assert_eq!(splice("<svg/>", &[]), "<svg/>");
    }

    #[test]
    fn test_with_splices_reparses() {
        let doc = Document::parse(r#"<svg fill="red"/>"#).unwrap();
        let span = doc.root().attr("fill").unwrap().value_span();
        let next = doc
            .with_splices(&[Splice::replace(span, "blue")])
            .unwrap();
        assert_eq!(next.as_str(), r#"<svg fill="blue"/>"#);
        assert_eq!(next.root().attr_value("fill"), Some("blue"));
        assert_eq!(doc.as_str(), r#"<svg fill="red"/>"#);
    }
}
