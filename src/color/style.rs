//! Inline `style` attribute scanning.
//!
//! Works on the raw (still escaped) attribute text so that every declaration
//! value can be located by byte offset and rewritten in place. Character
//! references (`&quot;`) are skipped as a unit, so the `;` that terminates
//! them never splits a declaration.

use std::ops::Range;

/// One `property: value` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name.
    pub property: String,
    /// Value range within the scanned text, trimmed, without `!important`.
    pub value: Range<usize>,
}

/// Scan all declarations in document order.
pub fn declarations(raw: &str) -> Vec<Declaration> {
    let bytes = raw.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let mut b = bytes[i];
        if b == b'&'
            && let Some(end) = entity_end(bytes, i)
        {
            // Escaped quotes still open and close strings.
            b = entity_quote(&bytes[i + 1..end]).unwrap_or(b'&');
            i = end;
        }
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b';' if depth == 0 => {
                    out.extend(parse_declaration(raw, start..i));
                    start = i + 1;
                }
                _ => {}
            },
        }
        i += 1;
    }
    out.extend(parse_declaration(raw, start..raw.len()));
    out
}

/// Find the effective (last) declaration of `property`.
pub fn find(raw: &str, property: &str) -> Option<Declaration> {
    declarations(raw)
        .into_iter()
        .rev()
        .find(|d| d.property == property)
}

/// Index of the `;` closing a character reference starting at `amp`.
fn entity_end(bytes: &[u8], amp: usize) -> Option<usize> {
    let rest = bytes.get(amp + 1..)?;
    let len = rest
        .iter()
        .take(12)
        .position(|&b| b == b';')?;
    let name = &rest[..len];
    let valid = !name.is_empty()
        && (name[0] == b'#' || name[0].is_ascii_alphabetic())
        && name[1..].iter().all(|b| b.is_ascii_alphanumeric());
    valid.then_some(amp + 1 + len)
}

fn entity_quote(name: &[u8]) -> Option<u8> {
    match name {
        b"quot" | b"#34" | b"#x22" | b"#X22" => Some(b'"'),
        b"apos" | b"#39" | b"#x27" | b"#X27" => Some(b'\''),
        _ => None,
    }
}

fn parse_declaration(raw: &str, segment: Range<usize>) -> Option<Declaration> {
    let text = &raw[segment.clone()];
    let colon = text.find(':')?;
    let property = text[..colon].trim().to_ascii_lowercase();
    if property.is_empty() {
        return None;
    }

    let value_text = &text[colon + 1..];
    let mut value = trimmed(segment.start + colon + 1, value_text);
    let current = &raw[value.clone()];
    if let Some(bang) = current.rfind('!')
        && current[bang + 1..].trim().eq_ignore_ascii_case("important")
    {
        value = trimmed(value.start, &current[..bang]);
    }

    Some(Declaration { property, value })
}

/// Range of `text` (located at `offset`) without surrounding whitespace.
fn trimmed(offset: usize, text: &str) -> Range<usize> {
    let lead = text.len() - text.trim_start().len();
    let body = text.trim();
    offset + lead..offset + lead + body.len()
}
