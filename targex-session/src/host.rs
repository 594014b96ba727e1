use glam::{Vec2, Vec3};

use crate::config::Question;
use crate::spawn::SpawnCommand;

/// Opaque handle to a spawned target entity.
pub type TargetHandle = u64;

/// Status of the question dialog, as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogState {
    /// On screen, still waiting on the participant.
    Open,
    /// Closed with an answer.
    Answered(String),
    /// Closed without an answer; the session re-presents the question.
    Dismissed,
}

/// Host-side collaborators the session drives: the target-entity layer,
/// the question dialog surface, and session lifecycle bookkeeping. The
/// session only ever calls these from inside `on_tick`/`on_init`, on the
/// host's frame loop thread.
pub trait SessionHost {
    /// Creates a target entity. The handle is opaque to the session.
    fn spawn_target(&mut self, command: SpawnCommand) -> TargetHandle;

    /// Despawns every active target.
    fn clear_targets(&mut self);

    /// Number of targets currently alive.
    fn active_target_count(&self) -> usize;

    /// Name and absolute world position of each alive target that has
    /// trajectory logging enabled.
    fn logged_targets(&self) -> Vec<(String, Vec3)>;

    fn present_question(&mut self, question: &Question);
    fn dialog_state(&mut self) -> DialogState;

    /// Records `id` as completed for the active user.
    fn mark_session_complete(&mut self, id: &str);

    /// Persists user state at session end.
    fn save_user_state(&mut self);

    /// Session ids the user still has to run.
    fn remaining_sessions(&self) -> Vec<String>;

    /// Opens the host's settings surface after the scoreboard.
    fn open_settings(&mut self);
}

/// Environment signals sampled by the host once per tick and handed to
/// `Session::on_tick`.
#[derive(Clone, Copy, Debug)]
pub struct TickSignals {
    /// True once the continue/fire control has been released.
    pub continue_released: bool,
    /// Current view direction as (azimuth, elevation) degrees.
    pub view_direction: Vec2,
    /// Current player world position.
    pub player_position: Vec3,
}

impl Default for TickSignals {
    fn default() -> Self {
        Self {
            continue_released: false,
            view_direction: Vec2::ZERO,
            player_position: Vec3::ZERO,
        }
    }
}
