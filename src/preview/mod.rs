//! Preview state machine.
//!
//! Hover and click events move a small state value around; the directive
//! set for the renderer is a pure function of that state and the current
//! document (see [`directives`]). Nothing here touches the document.

mod directive;

use serde::{Deserialize, Serialize};

use crate::color::ColorKey;

pub use directive::{
    DirectiveSet, Emphasis, LatestDirectives, PreviewDirective, PreviewOptions, directives,
};

/// A stop addressed by its gradient and position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StopRef {
    pub gradient: String,
    pub index: usize,
}

impl StopRef {
    pub fn new(gradient: impl Into<String>, index: usize) -> Self {
        Self {
            gradient: gradient.into(),
            index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationTarget {
    Group(ColorKey),
    /// One stop of the gradient group `group`.
    ///
    /// `pinned` is set when the stop was entered from an isolated group, so
    /// leaving the stop goes back to isolation instead of hovering.
    Stop {
        stop: StopRef,
        group: ColorKey,
        pinned: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "target", rename_all = "lowercase")]
pub enum PreviewState {
    #[default]
    Idle,
    Hovering(ColorKey),
    Isolated(IsolationTarget),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "target", rename_all = "kebab-case")]
pub enum PreviewEvent {
    Enter(ColorKey),
    Leave,
    Click(ColorKey),
    Deselect,
    EnterStop(StopRef),
    LeaveStop,
}

impl PreviewState {
    /// The group currently highlighted, if any.
    pub fn active_group(&self) -> Option<&ColorKey> {
        match self {
            Self::Idle => None,
            Self::Hovering(key) => Some(key),
            Self::Isolated(IsolationTarget::Group(key)) => Some(key),
            Self::Isolated(IsolationTarget::Stop { group, .. }) => Some(group),
        }
    }

    pub fn is_isolated(&self) -> bool {
        matches!(self, Self::Isolated(_))
    }

    /// Next state after `event`. Events that do not apply leave the state as is.
    pub fn on(&self, event: &PreviewEvent) -> PreviewState {
        use IsolationTarget::{Group, Stop};

        match (self, event) {
            // Hover tracking is suspended while something is isolated.
            (Self::Isolated(_), PreviewEvent::Enter(_) | PreviewEvent::Leave) => self.clone(),
            (_, PreviewEvent::Enter(key)) => Self::Hovering(key.clone()),
            (_, PreviewEvent::Leave) => Self::Idle,

            (Self::Isolated(_), PreviewEvent::Click(key)) if self.active_group() == Some(key) => {
                Self::Idle
            }
            (_, PreviewEvent::Click(key)) => Self::Isolated(Group(key.clone())),

            (Self::Isolated(_), PreviewEvent::Deselect) => Self::Idle,
            (_, PreviewEvent::Deselect) => self.clone(),

            (_, PreviewEvent::EnterStop(stop)) => {
                let Some(group) = self.active_group() else {
                    return self.clone();
                };
                if group.gradient_id() != Some(stop.gradient.as_str()) {
                    return self.clone();
                }
                let pinned = match self {
                    Self::Isolated(Stop { pinned, .. }) => *pinned,
                    other => other.is_isolated(),
                };
                Self::Isolated(Stop {
                    stop: stop.clone(),
                    group: group.clone(),
                    pinned,
                })
            }

            (Self::Isolated(Stop { group, pinned, .. }), PreviewEvent::LeaveStop) => {
                if *pinned {
                    Self::Isolated(Group(group.clone()))
                } else {
                    Self::Hovering(group.clone())
                }
            }
            (_, PreviewEvent::LeaveStop) => self.clone(),
        }
    }
}
