use serde::{Deserialize, Serialize};

/// Phases of trial presentation, in session order. Exactly one is active
/// at a time; transitions are driven once per simulation tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationState {
    #[default]
    Initial,
    Ready,
    Task,
    Feedback,
    Scoreboard,
    Complete,
}

impl PresentationState {
    /// True while the timed task window is open.
    pub fn is_task(&self) -> bool {
        matches!(self, Self::Task)
    }

    /// True once no further transitions can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// States whose entry re-runs target setup: Task spawns the trial's
    /// targets, Feedback spawns the idle reference target.
    pub fn spawns_targets(&self) -> bool {
        matches!(self, Self::Task | Self::Feedback)
    }
}
