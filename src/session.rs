//! Editing session over one loaded document.
//!
//! Holds the loaded snapshot, the current snapshot, and the maps derived
//! from the current one. Every state change swaps whole snapshots.

use crate::apply::{EditError, EditRequest, apply};
use crate::discover::{ElementColorMap, GradientTable, discover};
use crate::document::{Document, ParseError};
use crate::preview::{DirectiveSet, PreviewDirective, PreviewOptions, PreviewState, directives};

#[derive(Debug, Clone)]
pub struct Session {
    loaded: Document,
    current: Document,
    colors: ElementColorMap,
    gradients: GradientTable,
    generation: u64,
}

impl Session {
    pub fn load(markup: &str) -> Result<Self, ParseError> {
        Ok(Self::from_document(Document::parse(markup)?))
    }

    pub fn from_document(doc: Document) -> Self {
        let (colors, gradients) = discover(&doc);
        Self {
            loaded: doc.clone(),
            current: doc,
            colors,
            gradients,
            generation: 0,
        }
    }

    /// Apply `request` to the current document.
    ///
    /// On error the session is unchanged.
    pub fn apply(&mut self, request: &EditRequest) -> Result<(), EditError> {
        let next = apply(&self.current, request)?;
        self.replace(next);
        Ok(())
    }

    /// Back to the markup as loaded.
    pub fn reset(&mut self) {
        self.replace(self.loaded.clone());
    }

    fn replace(&mut self, doc: Document) {
        let (colors, gradients) = discover(&doc);
        self.current = doc;
        self.colors = colors;
        self.gradients = gradients;
    }

    pub fn markup(&self) -> &str {
        self.current.as_str()
    }

    pub fn document(&self) -> &Document {
        &self.current
    }

    pub fn colors(&self) -> &ElementColorMap {
        &self.colors
    }

    pub fn gradients(&self) -> &GradientTable {
        &self.gradients
    }

    /// Whether the current markup differs from what was loaded.
    pub fn is_modified(&self) -> bool {
        !self.current.same_markup(&self.loaded)
    }

    pub fn preview(&self, state: &PreviewState, opts: &PreviewOptions) -> Vec<PreviewDirective> {
        directives(state, &self.current, &self.colors, &self.gradients, opts)
    }

    /// Like [`preview`](Self::preview), tagged with a fresh generation.
    pub fn preview_set(&mut self, state: &PreviewState, opts: &PreviewOptions) -> DirectiveSet {
        self.generation += 1;
        DirectiveSet::new(self.generation, self.preview(state, opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::StopEdit;
    use crate::color::{ColorKey, Rgba};
    use crate::preview::{Emphasis, LatestDirectives};

    const BADGE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg">
  <linearGradient id="shine"><stop stop-color="gold"/></linearGradient>
  <circle fill="url(#shine)"/>
  <path fill="#333" stroke="#333"/>
</svg>"##;

    fn dark() -> ColorKey {
        ColorKey::Solid(Rgba::opaque(0x33, 0x33, 0x33))
    }

    #[test]
    fn test_load_and_inspect() {
        let session = Session::load(BADGE).unwrap();
        assert_eq!(session.markup(), BADGE);
        assert_eq!(session.colors().len(), 3);
        assert!(session.gradients().contains("shine"));
        assert!(!session.is_modified());
    }

    #[test]
    fn test_load_rejects_malformed() {
        assert!(Session::load("<svg><g></svg>").is_err());
    }

    #[test]
    fn test_apply_refreshes_maps() {
        let mut session = Session::load(BADGE).unwrap();
        session
            .apply(&EditRequest::new().recolor(dark(), "white"))
            .unwrap();

        assert!(session.is_modified());
        assert!(!session.colors().contains(&dark()));
        let white = ColorKey::Solid(Rgba::opaque(255, 255, 255));
        assert_eq!(session.colors().get(&white).unwrap().members.len(), 2);
    }

    #[test]
    fn test_failed_apply_keeps_state() {
        let mut session = Session::load(BADGE).unwrap();
        session
            .apply(&EditRequest::new().recolor(dark(), "#000"))
            .unwrap();
        let before = session.markup().to_string();

        let bad = EditRequest::new()
            .recolor(ColorKey::Solid(Rgba::opaque(0, 0, 0)), "red")
            .stop(StopEdit::new("missing", 0).with_color("red"));
        assert!(session.apply(&bad).is_err());
        assert_eq!(session.markup(), before);
    }

    #[test]
    fn test_reset() {
        let mut session = Session::load(BADGE).unwrap();
        session
            .apply(&EditRequest::new().stop(StopEdit::new("shine", 0).with_opacity(0.5)))
            .unwrap();
        session.reset();
        assert_eq!(session.markup(), BADGE);
        assert!(!session.is_modified());
        assert_eq!(session.gradients().get("shine").unwrap().stops[0].opacity, 1.0);
    }

    #[test]
    fn test_preview_generations() {
        let mut session = Session::load(BADGE).unwrap();
        let opts = PreviewOptions::default();
        let mut latest = LatestDirectives::default();

        let first = session.preview_set(&PreviewState::Hovering(dark()), &opts);
        let second = session.preview_set(&PreviewState::Idle, &opts);
        assert!(latest.offer(second));
        assert!(!latest.offer(first));

        let current = latest.current().unwrap();
        assert!(current.directives.iter().all(|d| d.emphasis == Emphasis::None));
    }
}
