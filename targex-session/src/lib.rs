pub mod buffers;
pub mod config;
pub mod error;
pub mod host;
pub mod ledger;
pub mod response;
pub mod session;
pub mod spawn;

pub use config::{LogConfig, Question, ReferenceTarget, SessionConfig, TimingConfig, WeaponConfig};
pub use error::ConfigError;
pub use host::{DialogState, SessionHost, TargetHandle, TickSignals};
pub use ledger::{LedgerEntry, TrialLedger};
pub use response::{ResponseOutcome, TargetTally};
pub use session::{EnvSnapshot, Session, SessionEvent, poll_event};
pub use spawn::{MotionKind, SpawnCommand, SpawnFrame};
