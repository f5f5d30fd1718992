//! Color tokens and their canonical keys.
//!
//! Every color-bearing value found in a document is reduced to a [`ColorKey`]
//! so that visually identical colors written differently (`#F00`,
//! `rgb(255, 0, 0)`, `red`) land in the same group.
//!
//! # Modules
//!
//! - [`parse`]: token grammar (hex, `rgb()`, `hsl()`, named, `url()`, keywords)
//! - [`named`]: fixed CSS named color table
//! - [`style`]: inline `style` attribute declaration scanner

mod named;
mod parse;
pub mod style;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use parse::{canonicalize, parse_paint};
pub(crate) use parse::parse_for;

// ============================================================================
// Rgba
// ============================================================================

/// An sRGB color with alpha quantized to hundredths.
///
/// Alpha is stored as a percentage (`0..=100`), so two colors whose alpha
/// differs by less than 0.005 compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 100 }
    }

    /// Build a color from an alpha in `0.0..=1.0` (clamped, NaN is opaque).
    pub fn with_alpha(r: u8, g: u8, b: u8, alpha: f32) -> Self {
        Self {
            r,
            g,
            b,
            alpha: quantize_alpha(alpha),
        }
    }

    pub fn opacity(&self) -> f32 {
        f32::from(self.alpha) / 100.0
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha == 100
    }

    /// Lowercase `#rrggbb`, or `#rrggbbaa` when translucent.
    ///
    /// This is the single output format used when rewriting markup.
    pub fn to_hex(&self) -> String {
        if self.is_opaque() {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            let a = (self.opacity() * 255.0).round() as u8;
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, a)
        }
    }
}

/// Quantize an alpha value to hundredths.
pub(crate) fn quantize_alpha(alpha: f32) -> u8 {
    if alpha.is_nan() {
        return 100;
    }
    (alpha.clamp(0.0, 1.0) * 100.0).round() as u8
}

// ============================================================================
// Paint
// ============================================================================

/// Which grammar a property accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// `fill`/`stroke`: colors plus `url()` references and `none`.
    Paint,
    /// `stop-color` and filter colors: plain colors only.
    Color,
}

/// A parsed color token, before gradient references are resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Color(Rgba),
    /// `url(#id)`; the id without the leading `#`.
    Reference(String),
    CurrentColor,
    /// `none` or `transparent`.
    None,
    /// `inherit`, `initial`, `unset`: no explicit color.
    Inherit,
    Invalid,
}

// ============================================================================
// ColorKey
// ============================================================================

/// Canonical key used to group color references.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColorKey {
    Solid(Rgba),
    /// Reference to a gradient present in the document.
    Gradient(String),
    /// `currentColor`, kept as its own group rather than guessed.
    CurrentColor,
    /// `none`/`transparent`. Never part of an editable group.
    NoPaint,
    /// Broken reference or unparseable token.
    Unresolved,
}

impl ColorKey {
    pub fn gradient_id(&self) -> Option<&str> {
        match self {
            Self::Gradient(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solid(c) if c.is_opaque() => {
                write!(f, "#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
            }
            Self::Solid(c) => write!(
                f,
                "#{:02x}{:02x}{:02x}@{:.2}",
                c.r,
                c.g,
                c.b,
                c.opacity()
            ),
            Self::Gradient(id) => write!(f, "url(#{id})"),
            Self::CurrentColor => f.write_str("currentColor"),
            Self::NoPaint => f.write_str("none"),
            Self::Unresolved => f.write_str("unresolved"),
        }
    }
}

/// Error returned when a string is neither a key nor a color token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{0}` is not a color key")]
pub struct ParseKeyError(pub String);

impl FromStr for ColorKey {
    type Err = ParseKeyError;

    /// Accepts the display form (`#ff0000@0.50`, `unresolved`, ...) as well as
    /// any token the canonicalizer understands.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unresolved") {
            return Ok(Self::Unresolved);
        }

        if let Some((color, alpha)) = s.split_once('@') {
            let alpha: f32 = alpha
                .trim()
                .parse()
                .map_err(|_| ParseKeyError(s.to_string()))?;
            return match parse_paint(color) {
                Paint::Color(c) => Ok(Self::Solid(Rgba::with_alpha(c.r, c.g, c.b, alpha))),
                _ => Err(ParseKeyError(s.to_string())),
            };
        }

        match parse_paint(s) {
            Paint::Color(c) => Ok(Self::Solid(c)),
            Paint::Reference(id) => Ok(Self::Gradient(id)),
            Paint::CurrentColor => Ok(Self::CurrentColor),
            Paint::None => Ok(Self::NoPaint),
            Paint::Inherit | Paint::Invalid => Err(ParseKeyError(s.to_string())),
        }
    }
}

impl Serialize for ColorKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ColorKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================
