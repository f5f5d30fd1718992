//! Per-element directives derived from a preview state.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::{IsolationTarget, PreviewState, StopRef};
use crate::color::ColorKey;
use crate::discover::{ElementColorMap, GradientTable};
use crate::document::{Document, ElementId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    None,
    Pulse,
    Isolated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewDirective {
    pub element: ElementId,
    pub opacity: f32,
    pub emphasis: Emphasis,
}

/// Opacities applied to elements outside the active group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewOptions {
    pub hover_opacity: f32,
    pub isolate_opacity: f32,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            hover_opacity: 0.1,
            isolate_opacity: 0.05,
        }
    }
}

/// Directives for every element of `doc`, in document order.
pub fn directives(
    state: &PreviewState,
    doc: &Document,
    map: &ElementColorMap,
    gradients: &GradientTable,
    opts: &PreviewOptions,
) -> Vec<PreviewDirective> {
    let (active, emphasis, dimmed) = match state {
        PreviewState::Idle => (FxHashSet::default(), Emphasis::None, 1.0),
        PreviewState::Hovering(key) => (group_members(map, key), Emphasis::Pulse, opts.hover_opacity),
        PreviewState::Isolated(IsolationTarget::Group(key)) => {
            (group_members(map, key), Emphasis::Isolated, opts.isolate_opacity)
        }
        PreviewState::Isolated(IsolationTarget::Stop { stop, .. }) => (
            stop_members(map, gradients, stop),
            Emphasis::Isolated,
            opts.isolate_opacity,
        ),
    };

    doc.elements()
        .map(|el| {
            let element = el.id().clone();
            if active.contains(&element) {
                PreviewDirective {
                    element,
                    opacity: 1.0,
                    emphasis,
                }
            } else {
                PreviewDirective {
                    element,
                    opacity: dimmed,
                    emphasis: Emphasis::None,
                }
            }
        })
        .collect()
}

fn group_members(map: &ElementColorMap, key: &ColorKey) -> FxHashSet<ElementId> {
    map.get(key)
        .map(|group| group.elements().cloned().collect())
        .unwrap_or_default()
}

/// The stop element plus everything painted with a gradient that renders
/// with that stop.
///
/// A stop addressed through a gradient without stops of its own resolves to
/// the ancestor whose stops it inherits.
fn stop_members(
    map: &ElementColorMap,
    gradients: &GradientTable,
    stop: &StopRef,
) -> FxHashSet<ElementId> {
    let mut members = FxHashSet::default();
    let Some(owner) = gradients.stop_owner(&stop.gradient) else {
        return members;
    };
    if let Some(s) = owner.stops.get(stop.index) {
        members.insert(s.element.clone());
    }
    for group in map.iter() {
        if let Some(id) = group.key.gradient_id()
            && gradients.uses_stops_of(id, &owner.id)
        {
            members.extend(group.elements().cloned());
        }
    }
    members
}

// ============================================================================
// Generations
// ============================================================================

/// A directive set tagged with the interaction that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectiveSet {
    pub generation: u64,
    pub directives: Vec<PreviewDirective>,
}

impl DirectiveSet {
    pub fn new(generation: u64, directives: Vec<PreviewDirective>) -> Self {
        Self {
            generation,
            directives,
        }
    }

    /// Directives that differ from `previous` (new elements included).
    pub fn changed_from<'a>(&'a self, previous: &DirectiveSet) -> Vec<&'a PreviewDirective> {
        let before: FxHashMap<&ElementId, &PreviewDirective> = previous
            .directives
            .iter()
            .map(|d| (&d.element, d))
            .collect();
        self.directives
            .iter()
            .filter(|d| before.get(&d.element) != Some(d))
            .collect()
    }
}

/// Holds the newest directive set; stale generations are dropped.
#[derive(Debug, Default)]
pub struct LatestDirectives {
    current: Option<DirectiveSet>,
}

impl LatestDirectives {
    /// Keep `set` if it is strictly newer than what is held.
    pub fn offer(&mut self, set: DirectiveSet) -> bool {
        if let Some(current) = &self.current
            && set.generation <= current.generation
        {
            return false;
        }
        self.current = Some(set);
        true
    }

    pub fn current(&self) -> Option<&DirectiveSet> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::discover::discover;
    use crate::preview::PreviewEvent;

    const SCENE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg">
  <defs>
    <linearGradient id="sky"><stop stop-color="red"/><stop stop-color="blue"/></linearGradient>
    <linearGradient id="dusk" href="#sky"/>
  </defs>
  <rect id="a" fill="red"/>
  <rect id="b" fill="url(#sky)"/>
  <rect id="c" fill="url(#dusk)"/>
  <rect id="d" stroke="green"/>
</svg>"##;

    fn red() -> ColorKey {
        ColorKey::Solid(Rgba::opaque(255, 0, 0))
    }

    fn compute(state: &PreviewState) -> Vec<PreviewDirective> {
        let doc = Document::parse(SCENE).unwrap();
        let (map, gradients) = discover(&doc);
        directives(state, &doc, &map, &gradients, &PreviewOptions::default())
    }

    fn lookup<'a>(set: &'a [PreviewDirective], id: &str) -> &'a PreviewDirective {
        set.iter().find(|d| d.element.as_str() == id).unwrap()
    }

    #[test]
    fn test_idle_is_neutral() {
        let set = compute(&PreviewState::Idle);
        assert_eq!(set.len(), Document::parse(SCENE).unwrap().elements().count());
        assert!(set.iter().all(|d| d.opacity == 1.0 && d.emphasis == Emphasis::None));
    }

    #[test]
    fn test_hover_pulses_exact_members() {
        let set = compute(&PreviewState::Hovering(red()));
        for d in &set {
            // rect a and the first stop are red
            let member = d.element.as_str() == "#a" || d.element.as_str().ends_with("stop[0]");
            if member {
                assert_eq!((d.opacity, d.emphasis), (1.0, Emphasis::Pulse));
            } else {
                assert_eq!((d.opacity, d.emphasis), (0.1, Emphasis::None));
            }
        }
    }

    #[test]
    fn test_isolate_group() {
        let state = PreviewState::Idle.on(&PreviewEvent::Click(ColorKey::Gradient("sky".into())));
        let set = compute(&state);
        assert_eq!(lookup(&set, "#b").emphasis, Emphasis::Isolated);
        assert_eq!(lookup(&set, "#c").opacity, 0.05);
        assert_eq!(lookup(&set, "#a").opacity, 0.05);
    }

    #[test]
    fn test_isolate_stop_covers_inheriting_gradients() {
        let state = PreviewState::Isolated(IsolationTarget::Stop {
            stop: StopRef::new("sky", 1),
            group: ColorKey::Gradient("sky".into()),
            pinned: true,
        });
        let set = compute(&state);
        assert_eq!(lookup(&set, "#b").emphasis, Emphasis::Isolated);
        assert_eq!(lookup(&set, "#c").emphasis, Emphasis::Isolated);
        assert_eq!(lookup(&set, "#a").opacity, 0.05);
        assert_eq!(lookup(&set, "#d").emphasis, Emphasis::None);

        let stops: Vec<_> = set
            .iter()
            .filter(|d| d.element.as_str().contains("stop["))
            .map(|d| d.emphasis)
            .collect();
        assert_eq!(stops, [Emphasis::None, Emphasis::Isolated]);
    }

    #[test]
    fn test_isolate_stop_skips_gradients_with_own_stops() {
        let doc = Document::parse(
            r##"<svg>
  <linearGradient id="base"><stop stop-color="red"/><stop offset="1" stop-color="blue"/></linearGradient>
  <linearGradient id="own" href="#base"><stop stop-color="lime"/></linearGradient>
  <rect id="uses_base" fill="url(#base)"/>
  <rect id="uses_own" fill="url(#own)"/>
</svg>"##,
        )
        .unwrap();
        let (map, gradients) = discover(&doc);
        let state = PreviewState::Isolated(IsolationTarget::Stop {
            stop: StopRef::new("base", 0),
            group: ColorKey::Gradient("base".into()),
            pinned: true,
        });
        let set = directives(&state, &doc, &map, &gradients, &PreviewOptions::default());

        assert_eq!(lookup(&set, "#uses_base").emphasis, Emphasis::Isolated);
        let own = lookup(&set, "#uses_own");
        assert_eq!((own.opacity, own.emphasis), (0.05, Emphasis::None));
    }

    #[test]
    fn test_isolate_inherited_stop() {
        let state = PreviewState::Idle
            .on(&PreviewEvent::Click(ColorKey::Gradient("dusk".into())))
            .on(&PreviewEvent::EnterStop(StopRef::new("dusk", 0)));
        let set = compute(&state);

        // dusk renders with sky's stops, so both users share the stop
        assert_eq!(lookup(&set, "#c").emphasis, Emphasis::Isolated);
        assert_eq!(lookup(&set, "#b").emphasis, Emphasis::Isolated);
        assert_eq!(lookup(&set, "#a").opacity, 0.05);
        let stops: Vec<_> = set
            .iter()
            .filter(|d| d.element.as_str().contains("stop["))
            .map(|d| d.emphasis)
            .collect();
        assert_eq!(stops, [Emphasis::Isolated, Emphasis::None]);
    }

    #[test]
    fn test_unknown_group_dims_everything() {
        let set = compute(&PreviewState::Hovering(ColorKey::Solid(Rgba::opaque(1, 2, 3))));
        assert!(set.iter().all(|d| d.opacity == 0.1));
    }

    #[test]
    fn test_idempotent() {
        let state = PreviewState::Hovering(red());
        assert_eq!(compute(&state), compute(&state));
    }

    #[test]
    fn test_custom_opacities() {
        let doc = Document::parse(SCENE).unwrap();
        let (map, gradients) = discover(&doc);
        let opts = PreviewOptions {
            hover_opacity: 0.3,
            isolate_opacity: 0.0,
        };
        let set = directives(&PreviewState::Hovering(red()), &doc, &map, &gradients, &opts);
        assert_eq!(lookup(&set, "#d").opacity, 0.3);
    }

    #[test]
    fn test_changed_from() {
        let idle = DirectiveSet::new(1, compute(&PreviewState::Idle));
        let hover = DirectiveSet::new(2, compute(&PreviewState::Hovering(red())));
        assert!(idle.changed_from(&idle).is_empty());
        // every element changes: members gain pulse, others dim
        assert_eq!(hover.changed_from(&idle).len(), hover.directives.len());
    }

    #[test]
    fn test_latest_directives_last_writer_wins() {
        let mut latest = LatestDirectives::default();
        assert!(latest.offer(DirectiveSet::new(2, Vec::new())));
        assert!(!latest.offer(DirectiveSet::new(1, Vec::new())));
        assert!(!latest.offer(DirectiveSet::new(2, Vec::new())));
        assert_eq!(latest.current().map(|s| s.generation), Some(2));
        assert!(latest.offer(DirectiveSet::new(3, Vec::new())));
    }
}
