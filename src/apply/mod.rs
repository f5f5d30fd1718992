//! Color application: document + edits → new document.
//!
//! Edits are resolved against a fresh discovery of the input, turned into
//! byte splices over the original markup, checked for overlaps, and applied
//! in one go. Either every edit lands or the input is returned untouched
//! through the error path.

mod error;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::color::{ColorKey, Paint, PropertyKind, parse_paint};
use crate::debug;
use crate::discover::{GradientTable, Site, discover};
use crate::document::{Document, ElementId, Splice};

pub use error::{EditError, InvalidReference};

// ============================================================================
// Requests
// ============================================================================

/// Recolor groups and gradient stops of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditRequest {
    /// Group key → replacement color token.
    pub colors: FxHashMap<ColorKey, String>,
    pub stops: Vec<StopEdit>,
}

impl EditRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recolor(mut self, key: ColorKey, token: impl Into<String>) -> Self {
        self.colors.insert(key, token.into());
        self
    }

    pub fn stop(mut self, edit: StopEdit) -> Self {
        self.stops.push(edit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty() && self.stops.is_empty()
    }
}

/// Rewrite one stop of a gradient, addressed by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopEdit {
    pub gradient: String,
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
}

impl StopEdit {
    pub fn new(gradient: impl Into<String>, index: usize) -> Self {
        Self {
            gradient: gradient.into(),
            index,
            color: None,
            opacity: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }
}

// ============================================================================
// Application
// ============================================================================

/// A pending splice and the element it belongs to.
struct Pending {
    splice: Splice,
    element: ElementId,
    /// Attribute name for insertions, used to catch duplicate inserts.
    inserts: Option<&'static str>,
}

/// Apply `request` to `doc`, producing a new snapshot.
///
/// Nothing is applied unless every edit is valid.
pub fn apply(doc: &Document, request: &EditRequest) -> Result<Document, EditError> {
    if request.is_empty() {
        return Ok(doc.clone());
    }

    let (map, gradients) = discover(doc);
    let mut pending = Vec::new();

    // Deterministic error reporting regardless of hash order.
    let mut colors: Vec<_> = request.colors.iter().collect();
    colors.sort_by_cached_key(|(key, _)| key.to_string());

    for (key, token) in colors {
        let group = map
            .get(key)
            .ok_or_else(|| InvalidReference::UnknownColor(key.clone()))?;
        for member in &group.members {
            let text = replacement(token, member.site, &gradients)?;
            pending.push(Pending {
                splice: Splice::replace(member.span.clone(), text),
                element: member.element.clone(),
                inserts: None,
            });
        }
    }

    for edit in &request.stops {
        stop_splices(edit, &gradients, &mut pending)?;
    }

    let splices = ordered(pending)?;
    debug!("apply"; "{} splices", splices.len());
    doc.with_splices(&splices).map_err(EditError::Reparse)
}

fn stop_splices(
    edit: &StopEdit,
    gradients: &GradientTable,
    pending: &mut Vec<Pending>,
) -> Result<(), EditError> {
    if !gradients.contains(&edit.gradient) {
        return Err(InvalidReference::UnknownGradient(edit.gradient.clone()).into());
    }
    // Gradients without stops of their own edit the stops they inherit.
    let stop = gradients
        .effective_stops(&edit.gradient)
        .get(edit.index)
        .ok_or_else(|| InvalidReference::UnknownStop {
            gradient: edit.gradient.clone(),
            index: edit.index,
        })?;

    if let Some(token) = &edit.color {
        let text = replacement(token, stop.color_site, gradients)?;
        pending.push(match &stop.color_span {
            Some(span) => Pending {
                splice: Splice::replace(span.clone(), text),
                element: stop.element.clone(),
                inserts: None,
            },
            None => Pending {
                splice: Splice::insert(stop.insert_at, format!(r#" stop-color="{text}""#)),
                element: stop.element.clone(),
                inserts: Some("stop-color"),
            },
        });
    }

    if let Some(opacity) = edit.opacity {
        if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
            return Err(EditError::InvalidOpacity(opacity));
        }
        let text = format_opacity(opacity);
        pending.push(match &stop.opacity_span {
            Some(span) => Pending {
                splice: Splice::replace(span.clone(), text),
                element: stop.element.clone(),
                inserts: None,
            },
            None => Pending {
                splice: Splice::insert(stop.insert_at, format!(r#" stop-opacity="{text}""#)),
                element: stop.element.clone(),
                inserts: Some("stop-opacity"),
            },
        });
    }

    Ok(())
}

/// Sort splices, merge insertions at the same offset, reject overlaps.
fn ordered(mut pending: Vec<Pending>) -> Result<Vec<Splice>, EditError> {
    pending.sort_by_key(|p| (p.splice.range.start, p.splice.range.end));

    let mut out: Vec<Pending> = Vec::with_capacity(pending.len());
    let mut inserted: Vec<(usize, &'static str)> = Vec::new();
    for next in pending {
        if let Some(name) = next.inserts {
            let at = next.splice.range.start;
            if inserted.contains(&(at, name)) {
                return Err(EditError::Conflict {
                    element: next.element,
                });
            }
            inserted.push((at, name));
        }

        if let Some(prev) = out.last_mut() {
            // Only attribute insertions merge; an empty value being replaced
            // twice is still two edits of one value.
            let both_insert = prev.inserts.is_some() && next.inserts.is_some();
            if both_insert && prev.splice.range.start == next.splice.range.start {
                prev.splice.text.push_str(&next.splice.text);
                continue;
            }
            if next.splice.range.start < prev.splice.range.end
                || prev.splice.range == next.splice.range
            {
                return Err(EditError::Conflict {
                    element: next.element,
                });
            }
        }
        out.push(next);
    }

    Ok(out.into_iter().map(|p| p.splice).collect())
}

/// Canonical replacement text for `token` written at `site`.
///
/// `none` and `transparent` are interchangeable here and written in the form
/// the site's grammar accepts.
fn replacement(token: &str, site: Site, gradients: &GradientTable) -> Result<String, EditError> {
    let kind = site.property().kind();
    let invalid = || EditError::InvalidColor {
        value: token.to_string(),
        site,
    };
    let text = match (parse_paint(token), kind) {
        (Paint::Color(c), _) => c.to_hex(),
        (Paint::Reference(_), PropertyKind::Color) => return Err(invalid()),
        (Paint::Reference(id), PropertyKind::Paint) => {
            if !gradients.contains(&id) {
                return Err(InvalidReference::UnknownGradient(id).into());
            }
            format!("url(#{id})")
        }
        (Paint::CurrentColor, _) => "currentColor".to_string(),
        (Paint::None, PropertyKind::Paint) => "none".to_string(),
        (Paint::None, PropertyKind::Color) => "transparent".to_string(),
        (Paint::Inherit | Paint::Invalid, _) => return Err(invalid()),
    };
    Ok(quick_xml::escape::escape(text.as_str()).into_owned())
}

/// Shortest decimal form, at most three places (`0.5`, `1`, `0.125`).
fn format_opacity(opacity: f32) -> String {
    let rounded = (opacity * 1000.0).round() / 1000.0;
    format!("{rounded}")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::discover::Property;

    const ICON: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">
  <!-- body -->
  <defs>
    <linearGradient id="sky">
      <stop offset="0" stop-color="#FF0000"/>
      <stop offset="1" style="stop-color: blue; stop-opacity: 0.5"/>
    </linearGradient>
    <linearGradient id="sea"><stop offset="0"/></linearGradient>
  </defs>
  <rect id="bg" fill="url(#sky)"   stroke="red"/>
  <circle fill="rgb(255, 0, 0)" style="stroke: #00F !important"/>
  <path fill="url(#sea)" stroke="url(#gone)"/>
</svg>"##;

    fn red() -> ColorKey {
        ColorKey::Solid(Rgba::opaque(255, 0, 0))
    }

    fn blue() -> ColorKey {
        ColorKey::Solid(Rgba::opaque(0, 0, 255))
    }

    fn icon() -> Document {
        Document::parse(ICON).unwrap()
    }

    #[test]
    fn test_empty_request_is_identity() {
        let doc = icon();
        let out = apply(&doc, &EditRequest::new()).unwrap();
        assert!(out.same_markup(&doc));
        assert_eq!(out.as_str(), ICON);
    }

    #[test]
    fn test_recolor_group_rewrites_every_member() {
        let doc = icon();
        let request = EditRequest::new().recolor(red(), "Lime");
        let out = apply(&doc, &request).unwrap();

        let (map, _) = discover(&out);
        assert!(map.get(&red()).is_none());
        let lime = map.get(&ColorKey::Solid(Rgba::opaque(0, 255, 0))).unwrap();
        assert_eq!(lime.members.len(), 3);
        assert!(out.as_str().contains(r##"<stop offset="0" stop-color="#00ff00"/>"##));
        assert!(out.as_str().contains(r##"stroke="#00ff00"/>"##));
        assert!(out.as_str().contains(r##"<circle fill="#00ff00""##));
    }

    #[test]
    fn test_locality() {
        let doc = icon();
        let out = apply(&doc, &EditRequest::new().recolor(blue(), "#123456")).unwrap();

        // Only the two blue declarations change; everything else byte-equal.
        let expected = ICON
            .replace("stop-color: blue", "stop-color: #123456")
            .replace("stroke: #00F !important", "stroke: #123456 !important");
        assert_eq!(out.as_str(), expected);
    }

    #[test]
    fn test_round_trip_color_map() {
        let doc = icon();
        let out = apply(&doc, &EditRequest::new().recolor(red(), "#abcdef")).unwrap();
        let reparsed = Document::parse(&out.to_markup()).unwrap();

        let (a, _) = discover(&out);
        let (b, _) = discover(&reparsed);
        let keys_a: Vec<_> = a.keys().cloned().collect();
        let keys_b: Vec<_> = b.keys().cloned().collect();
        assert_eq!(keys_a, keys_b);
        for (ga, gb) in a.iter().zip(b.iter()) {
            assert_eq!(ga.members, gb.members);
        }
    }

    #[test]
    fn test_identities_survive_edits() {
        let doc = icon();
        let out = apply(&doc, &EditRequest::new().recolor(red(), "#000")).unwrap();
        let before: Vec<_> = doc.elements().map(|e| e.id().clone()).collect();
        let after: Vec<_> = out.elements().map(|e| e.id().clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_translucent_output() {
        let doc = icon();
        let out = apply(&doc, &EditRequest::new().recolor(red(), "rgba(0, 0, 0, 0.5)")).unwrap();
        assert!(out.as_str().contains(r##"stroke="#00000080""##));
    }

    #[test]
    fn test_gradient_isolation() {
        let doc = icon();
        let request = EditRequest::new().stop(StopEdit::new("sky", 1).with_color("#0f0"));
        let out = apply(&doc, &request).unwrap();

        let (_, before) = discover(&doc);
        let (_, after) = discover(&out);
        assert_eq!(
            after.get("sky").unwrap().stops[1].color,
            ColorKey::Solid(Rgba::opaque(0, 255, 0))
        );
        assert_eq!(after.get("sky").unwrap().stops[0].color, before.get("sky").unwrap().stops[0].color);
        assert_eq!(after.get("sea").unwrap().stops[0].color, before.get("sea").unwrap().stops[0].color);
        // references to the gradient are untouched
        assert!(out.as_str().contains(r##"fill="url(#sky)""##));
    }

    #[test]
    fn test_stop_edit_is_local() {
        let src = r##"<svg xmlns="http://www.w3.org/2000/svg">
  <linearGradient id="fade">
    <stop offset="0" stop-color="red"/>
    <stop offset="1" stop-color="blue"/>
  </linearGradient>
  <rect id="a" fill="url(#fade)" stroke="red"/>
  <circle id="b" fill="url(#fade)"/>
  <path id="c" fill="red"/>
</svg>"##;
        let doc = Document::parse(src).unwrap();
        let request = EditRequest::new().stop(StopEdit::new("fade", 0).with_color("#00ff00"));
        let out = apply(&doc, &request).unwrap();

        let expected = src.replacen(
            r##"<stop offset="0" stop-color="red"/>"##,
            r##"<stop offset="0" stop-color="#00ff00"/>"##,
            1,
        );
        assert_eq!(out.as_str(), expected);

        // solid red outside the gradient keeps its group
        let (map, table) = discover(&out);
        let reds: Vec<_> = map.get(&red()).unwrap().elements().map(ElementId::as_str).collect();
        assert_eq!(reds, ["#a", "#c"]);
        let fade = table.get("fade").unwrap();
        assert_eq!(fade.stops[0].color, ColorKey::Solid(Rgba::opaque(0, 255, 0)));
        assert_eq!(fade.stops[1].color, blue());
    }

    #[test]
    fn test_stop_edit_through_href() {
        let src = r##"<svg>
  <linearGradient id="sky"><stop stop-color="red"/></linearGradient>
  <radialGradient id="dusk" href="#sky"/>
</svg>"##;
        let doc = Document::parse(src).unwrap();
        let out = apply(&doc, &EditRequest::new().stop(StopEdit::new("dusk", 0).with_color("navy")))
            .unwrap();
        assert_eq!(out.as_str(), src.replace(r#"stop-color="red""#, r##"stop-color="#000080""##));

        let err = apply(&doc, &EditRequest::new().stop(StopEdit::new("dusk", 1).with_color("navy")))
            .unwrap_err();
        assert_eq!(
            err,
            EditError::InvalidReference(InvalidReference::UnknownStop {
                gradient: "dusk".into(),
                index: 1
            })
        );
    }

    #[test]
    fn test_stop_insertion() {
        let doc = icon();
        let request = EditRequest::new().stop(
            StopEdit::new("sea", 0)
                .with_color("orange")
                .with_opacity(0.25),
        );
        let out = apply(&doc, &request).unwrap();
        assert!(out.as_str().contains(
            r##"<stop offset="0" stop-color="#ffa500" stop-opacity="0.25"/>"##
        ));
        let (_, table) = discover(&out);
        let stop = &table.get("sea").unwrap().stops[0];
        assert_eq!(stop.opacity, 0.25);
    }

    #[test]
    fn test_stop_opacity_in_style() {
        let doc = icon();
        let out = apply(&doc, &EditRequest::new().stop(StopEdit::new("sky", 1).with_opacity(1.0)))
            .unwrap();
        assert!(out.as_str().contains("stop-color: blue; stop-opacity: 1\""));
    }

    #[test]
    fn test_unknown_references_rejected() {
        let doc = icon();
        let unknown_color = EditRequest::new()
            .recolor(red(), "#000")
            .recolor(ColorKey::Solid(Rgba::opaque(1, 1, 1)), "#000");
        assert!(matches!(
            apply(&doc, &unknown_color),
            Err(EditError::InvalidReference(InvalidReference::UnknownColor(_)))
        ));

        let unknown_gradient = EditRequest::new().stop(StopEdit::new("nope", 0).with_color("red"));
        assert_eq!(
            apply(&doc, &unknown_gradient).unwrap_err(),
            EditError::InvalidReference(InvalidReference::UnknownGradient("nope".into()))
        );

        let unknown_stop = EditRequest::new().stop(StopEdit::new("sky", 2).with_color("red"));
        assert_eq!(
            apply(&doc, &unknown_stop).unwrap_err(),
            EditError::InvalidReference(InvalidReference::UnknownStop {
                gradient: "sky".into(),
                index: 2
            })
        );

        let none_key = EditRequest::new().recolor(ColorKey::NoPaint, "red");
        assert!(apply(&doc, &none_key).is_err());

        // input snapshot untouched
        assert_eq!(doc.as_str(), ICON);
    }

    #[test]
    fn test_invalid_tokens_rejected() {
        let doc = icon();
        let err = apply(&doc, &EditRequest::new().recolor(blue(), "nonsense")).unwrap_err();
        assert!(matches!(err, EditError::InvalidColor { .. }));

        // url() is not a color for stop-color members of the red group
        let err = apply(&doc, &EditRequest::new().recolor(red(), "url(#sea)")).unwrap_err();
        match err {
            EditError::InvalidColor { site, .. } => assert_eq!(site.property(), Property::StopColor),
            other => panic!("unexpected {other:?}"),
        }

        let err = apply(
            &doc,
            &EditRequest::new().recolor(ColorKey::Unresolved, "url(#missing)"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EditError::InvalidReference(InvalidReference::UnknownGradient(_))
        ));

        let err = apply(&doc, &EditRequest::new().stop(StopEdit::new("sky", 0).with_opacity(1.5)))
            .unwrap_err();
        assert_eq!(err, EditError::InvalidOpacity(1.5));
    }

    #[test]
    fn test_none_per_site_kind() {
        let doc = icon();
        let out = apply(&doc, &EditRequest::new().recolor(red(), "none")).unwrap();
        assert!(out.as_str().contains(r##"stop-color="transparent""##));
        assert!(out.as_str().contains(r##"<circle fill="none""##));
    }

    #[test]
    fn test_gradient_group_repoint() {
        let doc = icon();
        let out = apply(
            &doc,
            &EditRequest::new().recolor(ColorKey::Gradient("sky".into()), "url(#sea)"),
        )
        .unwrap();
        assert!(out.as_str().contains(r##"<rect id="bg" fill="url(#sea)"   stroke="red"/>"##));
    }

    #[test]
    fn test_unresolved_group_can_be_fixed() {
        let doc = icon();
        let out = apply(&doc, &EditRequest::new().recolor(ColorKey::Unresolved, "currentColor"))
            .unwrap();
        assert!(out.as_str().contains(r##"stroke="currentColor""##));
        let (map, _) = discover(&out);
        assert!(!map.contains(&ColorKey::Unresolved));
    }

    #[test]
    fn test_conflicting_edits() {
        let doc = icon();
        // the first stop of `sky` is also a member of the red group
        let request = EditRequest::new()
            .recolor(red(), "#000")
            .stop(StopEdit::new("sky", 0).with_color("#fff"));
        let err = apply(&doc, &request).unwrap_err();
        assert!(matches!(err, EditError::Conflict { .. }));

        let twice = EditRequest::new()
            .stop(StopEdit::new("sea", 0).with_color("#fff"))
            .stop(StopEdit::new("sea", 0).with_color("#000"));
        assert!(matches!(apply(&doc, &twice), Err(EditError::Conflict { .. })));
    }

    #[test]
    fn test_empty_values_replace_in_place() {
        let doc = Document::parse(
            r#"<svg><linearGradient id="g"><stop stop-color="" stop-opacity=""/></linearGradient></svg>"#,
        )
        .unwrap();

        let once = EditRequest::new().stop(StopEdit::new("g", 0).with_color("#fff").with_opacity(0.5));
        let out = apply(&doc, &once).unwrap();
        assert!(out.as_str().contains(r##"<stop stop-color="#ffffff" stop-opacity="0.5"/>"##));

        let twice = EditRequest::new()
            .stop(StopEdit::new("g", 0).with_color("#fff"))
            .stop(StopEdit::new("g", 0).with_color("#000"));
        assert!(matches!(apply(&doc, &twice), Err(EditError::Conflict { .. })));
    }

    #[test]
    fn test_request_from_toml() {
        let request: EditRequest = toml::from_str(
            r##"
[colors]
"#ff0000" = "navy"
"url(#sky)" = "url(#sea)"

[[stops]]
gradient = "sea"
index = 0
opacity = 0.5
"##,
        )
        .unwrap();
        assert_eq!(request.colors.get(&red()).map(String::as_str), Some("navy"));
        assert!(request.colors.contains_key(&ColorKey::Gradient("sky".into())));
        assert_eq!(request.stops, [StopEdit::new("sea", 0).with_opacity(0.5)]);
    }

    #[test]
    fn test_request_from_json() {
        let request: EditRequest =
            serde_json::from_str(r#"{"stops":[{"gradient":"sky","index":1,"color":"red"}]}"#)
                .unwrap();
        assert!(request.colors.is_empty());
        assert_eq!(request.stops[0].color.as_deref(), Some("red"));
    }

    #[test]
    fn test_format_opacity() {
        assert_eq!(format_opacity(1.0), "1");
        assert_eq!(format_opacity(0.5), "0.5");
        assert_eq!(format_opacity(0.1234), "0.123");
    }
}
