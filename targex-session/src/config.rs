use std::path::Path;

use serde::{Deserialize, Serialize};
use targex_core::{Condition, DestinationSpace, TargetSpec};

use crate::error::ConfigError;

/// State-machine durations, in seconds.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub ready_duration: f32,
    pub task_duration: f32,
    pub feedback_duration: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            ready_duration: 0.5,
            // Effectively unlimited; trials normally end on a full clear
            // or an empty magazine.
            task_duration: 100_000.0,
            feedback_duration: 1.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Minimum seconds between granted shots.
    pub fire_period: f32,
    /// Per-trial shot limit; reaching it ends the task window.
    pub max_ammo: u32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            fire_period: 0.5,
            max_ammo: 10_000,
        }
    }
}

/// Which result tables this session records. Each accumulator is gated
/// independently; `enable` is the master switch.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub enable: bool,
    pub log_trial_response: bool,
    pub log_target_trajectories: bool,
    pub log_player_actions: bool,
    pub log_frame_info: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enable: true,
            log_trial_response: true,
            log_target_trajectories: true,
            log_player_actions: true,
            log_frame_info: true,
        }
    }
}

/// The idle target shown outside the task window.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceTarget {
    pub size: f32,
    pub color: [u8; 4],
}

impl Default for ReferenceTarget {
    fn default() -> Self {
        Self {
            size: 0.05,
            color: [255, 0, 0, 255],
        }
    }
}

/// One question presented through the dialog host after the last trial.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
}

/// Complete session definition, loaded from JSON at startup. Every field
/// is strongly typed; malformed or missing keys fail the load or
/// `validate`, never a silent default lookup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    pub id: String,
    /// Session mode, recorded with each trial row. `"training"` switches
    /// on per-trial feedback messages.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub weapon: WeaponConfig,
    #[serde(default)]
    pub logging: LogConfig,
    /// Distance from the spawn origin to player-relative targets.
    #[serde(default = "default_target_distance")]
    pub target_distance: f32,
    #[serde(default = "default_target_color")]
    pub target_color: [u8; 4],
    #[serde(default)]
    pub reference_target: ReferenceTarget,
    #[serde(default)]
    pub questions: Vec<Question>,
    pub conditions: Vec<Condition>,
}

fn default_target_distance() -> f32 {
    1.0
}

fn default_target_color() -> [u8; 4] {
    [0, 255, 0, 255]
}

impl SessionConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Checks the definitions a session cannot start without. Called by
    /// `Session::on_init` before any state is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.conditions.is_empty() {
            return Err(ConfigError::NoConditions);
        }
        if self.timing.ready_duration < 0.0 {
            return Err(ConfigError::InvalidTiming {
                field: "ready_duration",
                requirement: "non-negative",
            });
        }
        if self.timing.task_duration <= 0.0 {
            return Err(ConfigError::InvalidTiming {
                field: "task_duration",
                requirement: "positive",
            });
        }
        if self.timing.feedback_duration < 0.0 {
            return Err(ConfigError::InvalidTiming {
                field: "feedback_duration",
                requirement: "non-negative",
            });
        }
        if self.weapon.fire_period < 0.0 {
            return Err(ConfigError::InvalidWeapon("fire_period must be non-negative"));
        }
        if self.weapon.max_ammo == 0 {
            return Err(ConfigError::InvalidWeapon("max_ammo must be at least 1"));
        }
        if self.target_distance <= 0.0 {
            return Err(ConfigError::InvalidTargetDistance(self.target_distance));
        }
        for condition in &self.conditions {
            if condition.targets.is_empty() {
                return Err(ConfigError::EmptyCondition(condition.name.clone()));
            }
            for target in &condition.targets {
                validate_target(target)?;
            }
        }
        Ok(())
    }
}

fn validate_target(target: &TargetSpec) -> Result<(), ConfigError> {
    let ranges: [(&'static str, (f32, f32)); 5] = [
        ("speed", target.speed),
        ("motion_change_period", target.motion_change_period),
        ("visual_size", target.visual_size),
        ("ecc_h", target.ecc_h),
        ("ecc_v", target.ecc_v),
    ];
    for (field, (lo, hi)) in ranges {
        if lo > hi {
            return Err(ConfigError::InvalidRange {
                target: target.id.clone(),
                field,
                lo,
                hi,
            });
        }
        if lo < 0.0 {
            return Err(ConfigError::NegativeValue {
                target: target.id.clone(),
                field,
                value: lo,
            });
        }
    }
    if target.destination_space == DestinationSpace::World
        && target.bounds.is_none()
        && target.destinations.is_empty()
    {
        return Err(ConfigError::MissingBounds(target.id.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use targex_core::Respawns;

    fn basic_target(id: &str) -> TargetSpec {
        TargetSpec {
            id: id.to_string(),
            name: String::new(),
            destination_space: DestinationSpace::Player,
            speed: (0.0, 5.0),
            motion_change_period: (0.5, 1.5),
            visual_size: (0.02, 0.05),
            ecc_h: (5.0, 15.0),
            ecc_v: (2.0, 8.0),
            respawns: Respawns::Count(1),
            upper_hemisphere_only: false,
            log_trajectory: true,
            destinations: Vec::new(),
            jump: None,
            bounds: None,
        }
    }

    fn basic_config() -> SessionConfig {
        SessionConfig {
            id: "s1".into(),
            description: String::new(),
            timing: TimingConfig::default(),
            weapon: WeaponConfig::default(),
            logging: LogConfig::default(),
            target_distance: 1.0,
            target_color: default_target_color(),
            reference_target: ReferenceTarget::default(),
            questions: Vec::new(),
            conditions: vec![Condition {
                name: "easy".into(),
                targets: vec![basic_target("t0")],
                trial_count: 2,
            }],
        }
    }

    #[test]
    fn valid_config_passes() {
        basic_config().validate().unwrap();
    }

    #[test]
    fn empty_condition_list_is_rejected() {
        let mut config = basic_config();
        config.conditions.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NoConditions)
        ));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut config = basic_config();
        config.conditions[0].targets[0].speed = (5.0, 1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRange { field: "speed", .. })
        ));
    }

    #[test]
    fn world_space_target_needs_bounds() {
        let mut config = basic_config();
        config.conditions[0].targets[0].destination_space = DestinationSpace::World;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingBounds(_))
        ));
    }

    #[test]
    fn zero_ammo_is_rejected() {
        let mut config = basic_config();
        config.weapon.max_ammo = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidWeapon(_))));
    }

    #[test]
    fn loads_from_json_with_defaults_filled_in() {
        let text = r#"{
            "id": "sess-a",
            "conditions": [{
                "name": "one",
                "trial_count": 3,
                "targets": [{
                    "id": "t0",
                    "destination_space": "player",
                    "speed": [0.0, 4.0],
                    "motion_change_period": [0.8, 1.2],
                    "visual_size": [0.02, 0.04],
                    "ecc_h": [5.0, 10.0],
                    "ecc_v": [1.0, 3.0],
                    "respawns": 2
                }]
            }]
        }"#;
        let config = SessionConfig::from_json_str(text).unwrap();
        config.validate().unwrap();
        assert_eq!(config.conditions[0].trial_count, 3);
        assert_eq!(
            config.conditions[0].targets[0].respawns,
            Respawns::Count(2)
        );
        assert!(config.logging.enable);
        assert!(config.conditions[0].targets[0].log_trajectory);
    }

    #[test]
    fn malformed_respawns_fails_the_load() {
        let text = r#"{
            "id": "sess-a",
            "conditions": [{
                "name": "one",
                "trial_count": 1,
                "targets": [{
                    "id": "t0",
                    "destination_space": "player",
                    "speed": [0.0, 4.0],
                    "motion_change_period": [0.8, 1.2],
                    "visual_size": [0.02, 0.04],
                    "ecc_h": [5.0, 10.0],
                    "ecc_v": [1.0, 3.0],
                    "respawns": -3
                }]
            }]
        }"#;
        assert!(matches!(
            SessionConfig::from_json_str(text),
            Err(ConfigError::Parse(_))
        ));
    }
}
