//! Color token grammar.
//!
//! Parsing never fails loudly: anything outside the grammar becomes
//! [`Paint::Invalid`] and is dealt with by the caller.

use super::{ColorKey, Paint, PropertyKind, Rgba, named, quantize_alpha};

/// Canonicalize a raw token for a property of the given kind.
///
/// References are returned as [`ColorKey::Gradient`] without checking that
/// the gradient exists; discovery downgrades dangling ones to
/// [`ColorKey::Unresolved`].
pub fn canonicalize(token: &str, kind: PropertyKind) -> ColorKey {
    match parse_for(token, kind) {
        Paint::Color(c) => ColorKey::Solid(c),
        Paint::Reference(id) => ColorKey::Gradient(id),
        Paint::CurrentColor => ColorKey::CurrentColor,
        Paint::None => ColorKey::NoPaint,
        Paint::Inherit | Paint::Invalid => ColorKey::Unresolved,
    }
}

/// Parse a token, rejecting forms the property kind does not accept.
pub(crate) fn parse_for(token: &str, kind: PropertyKind) -> Paint {
    let paint = parse_paint(token);
    match (kind, &paint) {
        (PropertyKind::Color, Paint::Reference(_)) => Paint::Invalid,
        (PropertyKind::Color, Paint::None) if token.trim().eq_ignore_ascii_case("none") => {
            Paint::Invalid
        }
        _ => paint,
    }
}

/// Parse a paint token (`fill`/`stroke` grammar, a superset of `<color>`).
pub fn parse_paint(token: &str) -> Paint {
    let token = token.trim();
    if token.is_empty() {
        return Paint::Invalid;
    }

    if let Some(hex) = token.strip_prefix('#') {
        return parse_hex(hex).map_or(Paint::Invalid, Paint::Color);
    }

    let lower = token.to_ascii_lowercase();
    match lower.as_str() {
        "none" | "transparent" => return Paint::None,
        "currentcolor" => return Paint::CurrentColor,
        "inherit" | "initial" | "unset" => return Paint::Inherit,
        _ => {}
    }

    if lower.starts_with("url(") {
        return parse_url(token).map_or(Paint::Invalid, Paint::Reference);
    }

    if let Some((name, args)) = split_function(&lower) {
        let color = match name {
            "rgb" | "rgba" => parse_rgb_args(args),
            "hsl" | "hsla" => parse_hsl_args(args),
            _ => None,
        };
        return color.map_or(Paint::Invalid, Paint::Color);
    }

    named::lookup(&lower).map_or(Paint::Invalid, Paint::Color)
}

// ============================================================================
// Hex
// ============================================================================

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => Some(Rgba::opaque(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Rgba {
            alpha: alpha_from_byte(nibble(3)?),
            ..Rgba::opaque(nibble(0)?, nibble(1)?, nibble(2)?)
        }),
        6 => Some(Rgba::opaque(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba {
            alpha: alpha_from_byte(byte(6)?),
            ..Rgba::opaque(byte(0)?, byte(2)?, byte(4)?)
        }),
        _ => None,
    }
}

fn alpha_from_byte(a: u8) -> u8 {
    quantize_alpha(f32::from(a) / 255.0)
}

// ============================================================================
// url()
// ============================================================================

/// Extract the fragment id from `url(#id)`, `url('#id')`, `url(#id) red`.
///
/// Non-fragment URLs keep their full text so they surface as broken refs.
fn parse_url(token: &str) -> Option<String> {
    let inner = &token[4..];
    let close = inner.find(')')?;
    let target = inner[..close]
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    if target.is_empty() {
        return None;
    }
    Some(target.strip_prefix('#').unwrap_or(target).to_string())
}

// ============================================================================
// Functional notations
// ============================================================================

/// Split `name(args)` into its parts; trailing garbage is rejected.
fn split_function(lower: &str) -> Option<(&str, &str)> {
    let open = lower.find('(')?;
    let rest = lower[open + 1..].trim_end();
    let args = rest.strip_suffix(')')?;
    Some((lower[..open].trim(), args))
}

/// Split arguments on commas, whitespace, and the `/` alpha separator.
fn split_args(args: &str) -> Vec<&str> {
    args.split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect()
}

fn parse_rgb_args(args: &str) -> Option<Rgba> {
    let parts = split_args(args);
    if !(3..=4).contains(&parts.len()) {
        return None;
    }
    let r = parse_channel(parts[0])?;
    let g = parse_channel(parts[1])?;
    let b = parse_channel(parts[2])?;
    let alpha = match parts.get(3) {
        Some(a) => parse_alpha(a)?,
        None => 1.0,
    };
    Some(Rgba::with_alpha(r, g, b, alpha))
}

fn parse_hsl_args(args: &str) -> Option<Rgba> {
    let parts = split_args(args);
    if !(3..=4).contains(&parts.len()) {
        return None;
    }
    let hue: f32 = parts[0].trim_end_matches("deg").parse().ok()?;
    let sat = parse_percent(parts[1])?;
    let light = parse_percent(parts[2])?;
    let alpha = match parts.get(3) {
        Some(a) => parse_alpha(a)?,
        None => 1.0,
    };
    let (r, g, b) = hsl_to_rgb(hue, sat, light);
    Some(Rgba::with_alpha(r, g, b, alpha))
}

/// `0..=255` number or `0%..=100%`, clamped and rounded.
fn parse_channel(raw: &str) -> Option<u8> {
    let value = match raw.strip_suffix('%') {
        Some(pct) => pct.parse::<f32>().ok()? * 2.55,
        None => raw.parse::<f32>().ok()?,
    };
    if !value.is_finite() {
        return None;
    }
    Some(value.clamp(0.0, 255.0).round() as u8)
}

/// `0..=1` number or percentage.
fn parse_alpha(raw: &str) -> Option<f32> {
    let value = match raw.strip_suffix('%') {
        Some(pct) => pct.parse::<f32>().ok()? / 100.0,
        None => raw.parse::<f32>().ok()?,
    };
    value.is_finite().then_some(value)
}

/// Percentage as a `0..=1` fraction. A bare number is accepted as percent.
fn parse_percent(raw: &str) -> Option<f32> {
    let value: f32 = raw.trim_end_matches('%').parse().ok()?;
    value
        .is_finite()
        .then_some((value / 100.0).clamp(0.0, 1.0))
}

fn hsl_to_rgb(hue: f32, sat: f32, light: f32) -> (u8, u8, u8) {
    let h = hue.rem_euclid(360.0) / 360.0;
    if sat == 0.0 {
        let v = (light * 255.0).round() as u8;
        return (v, v, v);
    }
    let q = if light < 0.5 {
        light * (1.0 + sat)
    } else {
        light + sat - light * sat
    };
    let p = 2.0 * light - q;
    let channel = |t: f32| {
        let t = t.rem_euclid(1.0);
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };
    (channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}
