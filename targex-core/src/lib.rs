pub mod condition;
pub mod records;
pub mod state;

pub use condition::{
    Condition, DestinationSpace, JumpParams, Respawns, TargetSpec, WorldBounds,
};
pub use records::{FrameInfo, PlayerAction, PlayerActionKind, TargetLocation};
pub use state::PresentationState;
