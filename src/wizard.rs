//! # Wizard Engine
//!
//! A finite-state walker over the schema's step list.
//!
//! ```text
//!   InProgress(0) ──next──▶ InProgress(1) ──next──▶ … ──next (last)──▶ Completed
//!        ▲                        │
//!        └─────────prev───────────┘            reset: any state ──▶ InProgress(0)
//! ```
//!
//! Navigation that makes no sense (back from the first step, anything but
//! reset once completed) is ignored rather than reported as an error. The
//! engine only knows positions; it never touches the invoice aggregate.

use serde::Serialize;
use tracing::debug;

use crate::schema::{Schema, StepDescriptor};

/// Where the walk currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "index")]
pub enum WizardState {
    InProgress(usize),
    Completed,
}

/// What a navigation call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Moved forward to the given step.
    Advanced(usize),
    /// Moved back to the given step.
    Retreated(usize),
    /// `next()` on the last step: the wizard is now complete.
    Finished,
    /// Returned to the first step.
    Reset,
    /// The call was a no-op in the current state.
    Ignored,
}

/// The label for the forward button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardLabel {
    Next,
    Skip,
    Finish,
}

impl ForwardLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForwardLabel::Next => "Next",
            ForwardLabel::Skip => "Skip",
            ForwardLabel::Finish => "Finish",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WizardEngine {
    step_count: usize,
    optional: Vec<bool>,
    state: WizardState,
}

impl WizardEngine {
    pub fn new(schema: &Schema) -> Self {
        Self {
            step_count: schema.len(),
            optional: schema.steps().iter().map(|s| s.optional).collect(),
            state: WizardState::InProgress(0),
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == WizardState::Completed
    }

    /// Index of the active step, or `None` once completed.
    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            WizardState::InProgress(i) => Some(i),
            WizardState::Completed => None,
        }
    }

    pub fn current_step<'s>(&self, schema: &'s Schema) -> Option<&'s StepDescriptor> {
        self.current_index().and_then(|i| schema.step(i))
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn is_last_step(&self) -> bool {
        self.current_index() == Some(self.last_index())
    }

    /// Whether "Prev" is enabled.
    pub fn can_go_back(&self) -> bool {
        matches!(self.state, WizardState::InProgress(i) if i > 0)
    }

    /// `Finish` on the last step, `Skip` on an optional step, `Next` otherwise.
    /// Behaviour of `next()` is the same for all three.
    pub fn forward_label(&self) -> ForwardLabel {
        match self.state {
            WizardState::InProgress(i) if i == self.last_index() => ForwardLabel::Finish,
            WizardState::InProgress(i) if self.optional.get(i).copied().unwrap_or(false) => {
                ForwardLabel::Skip
            }
            _ => ForwardLabel::Next,
        }
    }

    pub fn next(&mut self) -> Transition {
        let transition = match self.state {
            WizardState::InProgress(i) if i >= self.last_index() => {
                self.state = WizardState::Completed;
                Transition::Finished
            }
            WizardState::InProgress(i) => {
                self.state = WizardState::InProgress(i + 1);
                Transition::Advanced(i + 1)
            }
            WizardState::Completed => Transition::Ignored,
        };
        debug!(?transition, "wizard next");
        transition
    }

    pub fn prev(&mut self) -> Transition {
        let transition = match self.state {
            WizardState::InProgress(i) if i > 0 => {
                self.state = WizardState::InProgress(i - 1);
                Transition::Retreated(i - 1)
            }
            _ => Transition::Ignored,
        };
        debug!(?transition, "wizard prev");
        transition
    }

    pub fn reset(&mut self) -> Transition {
        self.state = WizardState::InProgress(0);
        debug!("wizard reset");
        Transition::Reset
    }

    fn last_index(&self) -> usize {
        self.step_count.saturating_sub(1)
    }
}
