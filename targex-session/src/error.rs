use thiserror::Error;

/// Configuration problems detected at session start. These are fatal: the
/// session refuses to run rather than defaulting its way past them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("session has no conditions configured")]
    NoConditions,

    #[error("condition `{0}` has no targets")]
    EmptyCondition(String),

    #[error("target `{target}`: {field} range ({lo}, {hi}) is not ordered min <= max")]
    InvalidRange {
        target: String,
        field: &'static str,
        lo: f32,
        hi: f32,
    },

    #[error("target `{target}`: {field} must not be negative, got {value}")]
    NegativeValue {
        target: String,
        field: &'static str,
        value: f32,
    },

    #[error("target `{0}` is world-space but has no bounds")]
    MissingBounds(String),

    #[error("timing: {field} must be {requirement}")]
    InvalidTiming {
        field: &'static str,
        requirement: &'static str,
    },

    #[error("weapon: {0}")]
    InvalidWeapon(&'static str),

    #[error("target distance must be positive, got {0}")]
    InvalidTargetDistance(f32),

    #[error("failed to create results file: {0}")]
    ResultsFile(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
