use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Discrete player events recorded alongside the passive aim trace.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerActionKind {
    Invalid,
    Nontask,
    Aim,
    Miss,
    Hit,
    Destroy,
}

impl PlayerActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerActionKind::Invalid => "invalid",
            PlayerActionKind::Nontask => "non-task",
            PlayerActionKind::Aim => "aim",
            PlayerActionKind::Miss => "miss",
            PlayerActionKind::Hit => "hit",
            PlayerActionKind::Destroy => "destroy",
        }
    }
}

/// Position of one logged target on one tick. The position is relative to
/// the player's spawn origin, not absolute world space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetLocation {
    pub time: f64,
    pub name: String,
    pub position: Vec3,
}

/// One player-action sample: either the per-tick aim trace or a discrete
/// event reported by the input layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerAction {
    pub time: f64,
    /// View direction as (azimuth, elevation) degrees.
    pub view_direction: Vec2,
    pub position: Vec3,
    pub kind: PlayerActionKind,
    /// Name of the target involved, empty for aim samples.
    pub target_name: String,
}

/// Timing sample for one simulation frame.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub time: f64,
    pub sim_delta: f32,
}
