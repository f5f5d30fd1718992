//! Color discovery: document → element color map + gradient table.
//!
//! One pre-order walk collects every explicit color declaration and every
//! gradient definition; a second pass over the collected references resolves
//! `url(#id)` against the finished gradient table (gradients may be defined
//! after their first use) and groups references by canonical key.
//!
//! Discovery never fails. Tokens that do not parse, `inherit`, and
//! `none`/`transparent` are left out of the map; dangling `url()` references
//! are kept under [`ColorKey::Unresolved`] so they can be surfaced.

mod gradient;

use std::fmt;
use std::ops::Range;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::color::{ColorKey, Paint, PropertyKind, parse_for, style};
use crate::debug;
use crate::document::{Document, Element, ElementId};

pub use gradient::{GradientDefinition, GradientKind, GradientStop, GradientTable};

// ============================================================================
// Sites
// ============================================================================

/// Color-bearing properties. This table is the whole vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Property {
    Fill,
    Stroke,
    StopColor,
    FloodColor,
    LightingColor,
}

impl Property {
    pub const ALL: [Property; 5] = [
        Self::Fill,
        Self::Stroke,
        Self::StopColor,
        Self::FloodColor,
        Self::LightingColor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::Stroke => "stroke",
            Self::StopColor => "stop-color",
            Self::FloodColor => "flood-color",
            Self::LightingColor => "lighting-color",
        }
    }

    pub fn kind(self) -> PropertyKind {
        match self {
            Self::Fill | Self::Stroke => PropertyKind::Paint,
            _ => PropertyKind::Color,
        }
    }

    /// Whether the property means anything on an element with this local name.
    pub fn applies_to(self, local_name: &str) -> bool {
        match self {
            Self::Fill | Self::Stroke => true,
            Self::StopColor => local_name == "stop",
            Self::FloodColor => matches!(local_name, "feFlood" | "feDropShadow"),
            Self::LightingColor => {
                matches!(local_name, "feDiffuseLighting" | "feSpecularLighting")
            }
        }
    }
}

/// Where a color is declared on an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "via", content = "property", rename_all = "lowercase")]
pub enum Site {
    /// Presentation attribute, e.g. `fill="red"`.
    Attribute(Property),
    /// Inline style declaration, e.g. `style="fill: red"`.
    Style(Property),
}

impl Site {
    pub fn property(self) -> Property {
        match self {
            Self::Attribute(p) | Self::Style(p) => p,
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute(p) => f.write_str(p.name()),
            Self::Style(p) => write!(f, "style:{}", p.name()),
        }
    }
}

/// The declaration of a property that actually applies to an element.
pub(crate) struct Effective {
    pub in_style: bool,
    /// Unescaped value text.
    pub value: String,
    /// Raw value range in the document source.
    pub span: Range<usize>,
}

/// Resolve `name` on `el`: the inline style wins over the attribute.
///
/// A style declaration `valid` rejects is dropped, as in the CSS cascade,
/// and the attribute applies instead.
pub(crate) fn effective_value(
    doc: &Document,
    el: &Element,
    name: &str,
    valid: impl Fn(&str) -> bool,
) -> Option<Effective> {
    if let Some(style_attr) = el.attr("style") {
        let value_span = style_attr.value_span();
        let raw = doc.slice(value_span.clone());
        if let Some(decl) = style::find(raw, name) {
            let text = &raw[decl.value.clone()];
            let value = quick_xml::escape::unescape(text)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| text.to_string());
            if valid(&value) {
                return Some(Effective {
                    in_style: true,
                    value,
                    span: value_span.start + decl.value.start..value_span.start + decl.value.end,
                });
            }
            debug!("discover"; "{} style:{}: dropping `{}`", el.id(), name, value);
        }
    }

    el.attr(name).map(|attr| Effective {
        in_style: false,
        value: attr.value().to_string(),
        span: attr.value_span(),
    })
}

// ============================================================================
// Color map
// ============================================================================

/// One color declaration in the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementColorRef {
    pub element: ElementId,
    pub site: Site,
    /// Value as written (unescaped).
    pub original: String,
    #[serde(skip)]
    pub(crate) span: Range<usize>,
}

/// References sharing a canonical key, edited as one color.
#[derive(Debug, Clone, Serialize)]
pub struct ColorGroup {
    pub key: ColorKey,
    pub members: Vec<ElementColorRef>,
}

impl ColorGroup {
    /// Distinct member elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &ElementId> {
        let mut last: Option<&ElementId> = None;
        self.members.iter().filter_map(move |m| {
            if last == Some(&m.element) {
                return None;
            }
            last = Some(&m.element);
            Some(&m.element)
        })
    }

    pub fn contains(&self, element: &ElementId) -> bool {
        self.members.iter().any(|m| &m.element == element)
    }
}

/// Color groups in order of first appearance in the document.
#[derive(Debug, Clone, Default)]
pub struct ElementColorMap {
    groups: Vec<ColorGroup>,
    index: FxHashMap<ColorKey, usize>,
}

impl ElementColorMap {
    fn push(&mut self, key: ColorKey, member: ElementColorRef) {
        match self.index.get(&key) {
            Some(&i) => self.groups[i].members.push(member),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push(ColorGroup {
                    key,
                    members: vec![member],
                });
            }
        }
    }

    pub fn get(&self, key: &ColorKey) -> Option<&ColorGroup> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    pub fn contains(&self, key: &ColorKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorGroup> {
        self.groups.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ColorKey> {
        self.groups.iter().map(|g| &g.key)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// No explicit colors: nothing to customize. Not an error.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Serialize for ElementColorMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.groups)
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Extract the element color map and gradient table of a document.
pub fn discover(doc: &Document) -> (ElementColorMap, GradientTable) {
    let mut pending: Vec<(ElementColorRef, Paint)> = Vec::new();
    let mut gradients = GradientTable::default();

    for el in doc.elements() {
        let local = el.local_name();
        for property in Property::ALL {
            if !property.applies_to(local) {
                continue;
            }
            let kind = property.kind();
            let valid = |v: &str| parse_for(v, kind) != Paint::Invalid;
            let Some(found) = effective_value(doc, el, property.name(), valid) else {
                continue;
            };
            let site = if found.in_style {
                Site::Style(property)
            } else {
                Site::Attribute(property)
            };
            let paint = parse_for(&found.value, property.kind());
            pending.push((
                ElementColorRef {
                    element: el.id().clone(),
                    site,
                    original: found.value,
                    span: found.span,
                },
                paint,
            ));
        }

        if let Some(def) = gradient::read_gradient(doc, el) {
            gradients.insert(def);
        }
    }

    let mut map = ElementColorMap::default();
    for (member, paint) in pending {
        let key = match paint {
            Paint::Color(c) => ColorKey::Solid(c),
            Paint::Reference(id) if gradients.contains(&id) => ColorKey::Gradient(id),
            Paint::Reference(id) => {
                debug!("discover"; "{} {}: broken reference #{}", member.element, member.site, id);
                ColorKey::Unresolved
            }
            Paint::CurrentColor => ColorKey::CurrentColor,
            Paint::None => continue,
            Paint::Inherit => continue,
            Paint::Invalid => {
                debug!("discover"; "{} {}: skipping `{}`", member.element, member.site, member.original);
                continue;
            }
        };
        map.push(key, member);
    }

    debug!(
        "discover";
        "{} color groups, {} gradients",
        map.len(),
        gradients.len()
    );
    (map, gradients)
}
