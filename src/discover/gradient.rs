//! Gradient definitions and their stops.

use std::ops::Range;

use rustc_hash::FxHashMap;
use serde::Serialize;

use super::{Property, Site, effective_value};
use crate::color::{ColorKey, Paint, PropertyKind, Rgba, canonicalize, parse_for};
use crate::document::{Document, Element, ElementId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    Linear,
    Radial,
}

impl GradientKind {
    fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "linearGradient" => Some(Self::Linear),
            "radialGradient" => Some(Self::Radial),
            _ => None,
        }
    }
}

/// One `<stop>` of a gradient.
#[derive(Debug, Clone, Serialize)]
pub struct GradientStop {
    pub element: ElementId,
    /// `0.0..=1.0`, never smaller than the previous stop's offset.
    pub offset: f32,
    pub color: ColorKey,
    pub opacity: f32,
    /// Where `stop-color` is declared, if anywhere.
    #[serde(skip)]
    pub(crate) color_site: Site,
    #[serde(skip)]
    pub(crate) color_span: Option<Range<usize>>,
    #[serde(skip)]
    pub(crate) opacity_span: Option<Range<usize>>,
    #[serde(skip)]
    pub(crate) insert_at: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradientDefinition {
    pub id: String,
    pub kind: GradientKind,
    pub element: ElementId,
    /// Gradient this one inherits from through `href`/`xlink:href`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub stops: Vec<GradientStop>,
}

/// Gradients keyed by id, in document order.
#[derive(Debug, Clone, Default)]
pub struct GradientTable {
    gradients: Vec<GradientDefinition>,
    index: FxHashMap<String, usize>,
}

impl GradientTable {
    /// First definition of an id wins.
    pub(crate) fn insert(&mut self, def: GradientDefinition) {
        if self.index.contains_key(&def.id) {
            return;
        }
        self.index.insert(def.id.clone(), self.gradients.len());
        self.gradients.push(def);
    }

    pub fn get(&self, id: &str) -> Option<&GradientDefinition> {
        self.index.get(id).map(|&i| &self.gradients[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GradientDefinition> {
        self.gradients.iter()
    }

    pub fn len(&self) -> usize {
        self.gradients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gradients.is_empty()
    }

    /// Gradient whose `<stop>`s `id` renders with: itself when it has any,
    /// otherwise the nearest ancestor on its `href` chain that does.
    pub fn stop_owner(&self, id: &str) -> Option<&GradientDefinition> {
        let mut current = self.get(id);
        for _ in 0..=self.gradients.len() {
            match current {
                Some(g) if !g.stops.is_empty() => return Some(g),
                Some(g) => current = g.href.as_deref().and_then(|h| self.get(h)),
                None => break,
            }
        }
        None
    }

    /// Stops a renderer would use for `id`.
    pub fn effective_stops(&self, id: &str) -> &[GradientStop] {
        self.stop_owner(id).map_or(&[], |g| &g.stops)
    }

    /// Whether painting with `id` uses the stops defined on `owner`.
    pub fn uses_stops_of(&self, id: &str, owner: &str) -> bool {
        self.stop_owner(id).is_some_and(|g| g.id == owner)
    }
}

impl Serialize for GradientTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.gradients)
    }
}

/// Read a gradient definition if `el` is an `id`-bearing gradient element.
pub(super) fn read_gradient(doc: &Document, el: &Element) -> Option<GradientDefinition> {
    let kind = GradientKind::from_local_name(el.local_name())?;
    let id = el.attr_value("id").map(str::trim).filter(|id| !id.is_empty())?;

    let href = el
        .attr_value("href")
        .or_else(|| el.attr_value("xlink:href"))
        .and_then(|h| h.trim().strip_prefix('#'))
        .map(str::to_string);

    let mut stops = Vec::new();
    let mut floor = 0.0f32;
    for stop in el.child_elements().filter(|c| c.local_name() == "stop") {
        let offset = stop
            .attr_value("offset")
            .and_then(parse_offset)
            .unwrap_or(0.0)
            .max(floor);
        floor = offset;
        stops.push(read_stop(doc, stop, offset));
    }

    Some(GradientDefinition {
        id: id.to_string(),
        kind,
        element: el.id().clone(),
        href,
        stops,
    })
}

fn read_stop(doc: &Document, stop: &Element, offset: f32) -> GradientStop {
    let color = effective_value(doc, stop, Property::StopColor.name(), |v| {
        parse_for(v, PropertyKind::Color) != Paint::Invalid
    });
    let opacity = effective_value(doc, stop, "stop-opacity", |v| parse_opacity(v).is_some());

    GradientStop {
        element: stop.id().clone(),
        offset,
        color: color.as_ref().map_or(ColorKey::Solid(Rgba::BLACK), |c| {
            canonicalize(&c.value, PropertyKind::Color)
        }),
        opacity: opacity
            .as_ref()
            .and_then(|o| parse_opacity(&o.value))
            .unwrap_or(1.0),
        color_site: match &color {
            Some(c) if c.in_style => Site::Style(Property::StopColor),
            _ => Site::Attribute(Property::StopColor),
        },
        color_span: color.map(|c| c.span),
        opacity_span: opacity.map(|o| o.span),
        insert_at: stop.insert_at(),
    }
}

/// `0.5` or `50%`, clamped to `0..=1`.
fn parse_offset(raw: &str) -> Option<f32> {
    let raw = raw.trim();
    let value = match raw.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f32>().ok()? / 100.0,
        None => raw.parse::<f32>().ok()?,
    };
    value.is_finite().then(|| value.clamp(0.0, 1.0))
}

fn parse_opacity(raw: &str) -> Option<f32> {
    parse_offset(raw)
}
