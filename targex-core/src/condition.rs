use glam::Vec3;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Whether a target's placement (and any waypoints) are expressed in
/// absolute world coordinates or relative to the player's view axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationSpace {
    World,
    Player,
}

/// Respawn budget for one target.
///
/// `Infinite` is the `-1` marker from the config format. Keeping it as a
/// variant means it can never leak into an arithmetic total; callers that
/// sum budgets must branch on it explicitly.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Respawns {
    Infinite,
    Count(u32),
}

impl Serialize for Respawns {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Respawns::Infinite => serializer.serialize_i64(-1),
            Respawns::Count(n) => serializer.serialize_i64(i64::from(*n)),
        }
    }
}

impl<'de> Deserialize<'de> for Respawns {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match i64::deserialize(deserializer)? {
            -1 => Ok(Respawns::Infinite),
            n if (0..=i64::from(u32::MAX)).contains(&n) => Ok(Respawns::Count(n as u32)),
            n => Err(D::Error::custom(format!(
                "respawn budget must be -1 (infinite) or a non-negative count, got {n}"
            ))),
        }
    }
}

/// Axis-aligned region that world-space targets spawn and travel inside.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min: Vec3,
    pub max: Vec3,
}

/// Parameter ranges for jumping targets, each sampled per spawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JumpParams {
    pub jump_period: (f32, f32),
    pub jump_speed: (f32, f32),
    pub gravity: (f32, f32),
}

fn default_true() -> bool {
    true
}

/// One target definition inside a condition. `(min, max)` pairs are
/// sampled uniformly at each spawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub id: String,
    /// Stamped at session setup as `{session}_{condition}_{id}_{index}`;
    /// flows into spawn commands and trajectory rows.
    #[serde(default)]
    pub name: String,
    pub destination_space: DestinationSpace,
    pub speed: (f32, f32),
    pub motion_change_period: (f32, f32),
    pub visual_size: (f32, f32),
    /// Horizontal eccentricity bounds, degrees off the view axis.
    pub ecc_h: (f32, f32),
    /// Vertical eccentricity bounds, degrees off the view axis.
    pub ecc_v: (f32, f32),
    pub respawns: Respawns,
    #[serde(default)]
    pub upper_hemisphere_only: bool,
    #[serde(default = "default_true")]
    pub log_trajectory: bool,
    /// Waypoints for destination-following targets; empty otherwise.
    #[serde(default)]
    pub destinations: Vec<Vec3>,
    #[serde(default)]
    pub jump: Option<JumpParams>,
    /// Required for world-space targets.
    #[serde(default)]
    pub bounds: Option<WorldBounds>,
}

/// An immutable trial condition: the targets it presents and how many
/// repetitions it owes the session. Created once at configuration time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    pub targets: Vec<TargetSpec>,
    pub trial_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respawns_decodes_the_infinite_marker() {
        let infinite: Respawns = serde_json::from_str("-1").unwrap();
        assert_eq!(infinite, Respawns::Infinite);

        let bounded: Respawns = serde_json::from_str("3").unwrap();
        assert_eq!(bounded, Respawns::Count(3));

        assert!(serde_json::from_str::<Respawns>("-2").is_err());
    }

    #[test]
    fn respawns_encodes_infinite_back_to_minus_one() {
        assert_eq!(serde_json::to_string(&Respawns::Infinite).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&Respawns::Count(2)).unwrap(), "2");
    }
}
