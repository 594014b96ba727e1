use glam::{EulerRot, Quat, Vec3};
use rand::Rng;
use targex_core::{Condition, DestinationSpace, JumpParams, Respawns, TargetSpec, WorldBounds};

use crate::config::ReferenceTarget;

/// Player pose captured once at session start. All player-relative spawn
/// geometry hangs off this frame; it never drifts with the live camera.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpawnFrame {
    pub origin: Vec3,
    /// Initial view heading, radians about the vertical axis.
    pub heading_radians: f32,
}

impl SpawnFrame {
    pub fn new(origin: Vec3, heading_radians: f32) -> Self {
        Self {
            origin,
            heading_radians,
        }
    }
}

/// Motion behavior requested from the entity host. The host owns the
/// motion model itself; this only selects and parameterizes it.
#[derive(Clone, Debug, PartialEq)]
pub enum MotionKind {
    Flying,
    Jumping(JumpParams),
    Waypoints(Vec<Vec3>),
}

/// Everything the entity host needs to create one target.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnCommand {
    pub position: Vec3,
    pub size: f32,
    pub color: [u8; 4],
    pub speed: (f32, f32),
    pub motion_change_period: (f32, f32),
    pub motion: MotionKind,
    pub world_space: bool,
    pub bounds: Option<WorldBounds>,
    pub upper_hemisphere_only: bool,
    pub spawn_origin: Vec3,
    pub id: String,
    pub index: usize,
    pub respawns: Respawns,
    pub name: String,
    pub log_trajectory: bool,
}

/// Uniform sample in `(min, max)` with the sign flipped with probability
/// one half.
fn signed_eccentricity<R: Rng>(rng: &mut R, range: (f32, f32)) -> f32 {
    let magnitude = rng.random_range(range.0..=range.1);
    if rng.random_bool(0.5) { magnitude } else { -magnitude }
}

fn sample_range<R: Rng>(rng: &mut R, range: (f32, f32)) -> f32 {
    rng.random_range(range.0..=range.1)
}

fn sample_bounds<R: Rng>(rng: &mut R, bounds: &WorldBounds) -> Vec3 {
    Vec3::new(
        rng.random_range(bounds.min.x..=bounds.max.x),
        rng.random_range(bounds.min.y..=bounds.max.y),
        rng.random_range(bounds.min.z..=bounds.max.z),
    )
}

/// Projects a point `distance` ahead of the spawn frame, offset from the
/// view axis by yaw and pitch in degrees. Heading zero faces -Z.
pub fn aim_point(frame: &SpawnFrame, yaw_deg: f32, pitch_deg: f32, distance: f32) -> Vec3 {
    let rotation = Quat::from_euler(
        EulerRot::YXZ,
        frame.heading_radians + yaw_deg.to_radians(),
        pitch_deg.to_radians(),
        0.0,
    );
    frame.origin + rotation * (Vec3::NEG_Z * distance)
}

fn place_target<R: Rng>(
    rng: &mut R,
    spec: &TargetSpec,
    frame: &SpawnFrame,
    target_distance: f32,
) -> Vec3 {
    let world_space = spec.destination_space == DestinationSpace::World;
    if world_space {
        match &spec.bounds {
            Some(bounds) => sample_bounds(rng, bounds),
            // Waypoint targets without bounds take over from their first
            // destination; the spawn offset is irrelevant.
            None => Vec3::ZERO,
        }
    } else {
        let yaw = signed_eccentricity(rng, spec.ecc_h);
        let pitch = signed_eccentricity(rng, spec.ecc_v);
        aim_point(frame, yaw, pitch, target_distance)
    }
}

/// Builds the spawn commands for one trial of `condition`. Placement for
/// player-relative targets samples horizontal and vertical eccentricity
/// independently within the configured bounds.
pub fn trial_spawns<R: Rng>(
    rng: &mut R,
    condition: &Condition,
    frame: &SpawnFrame,
    target_distance: f32,
    color: [u8; 4],
) -> Vec<SpawnCommand> {
    condition
        .targets
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let position = place_target(rng, spec, frame, target_distance);
            let motion = if !spec.destinations.is_empty() {
                MotionKind::Waypoints(spec.destinations.clone())
            } else if let Some(jump) = &spec.jump {
                MotionKind::Jumping(jump.clone())
            } else {
                MotionKind::Flying
            };
            SpawnCommand {
                position,
                size: sample_range(rng, spec.visual_size),
                color,
                speed: spec.speed,
                motion_change_period: spec.motion_change_period,
                motion,
                world_space: spec.destination_space == DestinationSpace::World,
                bounds: spec.bounds,
                upper_hemisphere_only: spec.upper_hemisphere_only,
                spawn_origin: frame.origin,
                id: spec.id.clone(),
                index,
                respawns: spec.respawns,
                name: spec.name.clone(),
                log_trajectory: spec.log_trajectory,
            }
        })
        .collect()
}

/// The idle display target: motionless, straight ahead of the spawn frame.
pub fn reference_spawn(
    frame: &SpawnFrame,
    target_distance: f32,
    reference: &ReferenceTarget,
) -> SpawnCommand {
    SpawnCommand {
        position: aim_point(frame, 0.0, 0.0, target_distance),
        size: reference.size,
        color: reference.color,
        speed: (0.0, 0.0),
        motion_change_period: (1000.0, 1000.0),
        motion: MotionKind::Flying,
        world_space: false,
        bounds: None,
        upper_hemisphere_only: false,
        spawn_origin: frame.origin,
        id: "reference".to_string(),
        index: 0,
        respawns: Respawns::Count(0),
        name: "reference".to_string(),
        log_trajectory: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn spec(ecc_h: (f32, f32), ecc_v: (f32, f32)) -> TargetSpec {
        TargetSpec {
            id: "t0".into(),
            name: "s_0_t0_0".into(),
            destination_space: DestinationSpace::Player,
            speed: (0.0, 4.0),
            motion_change_period: (0.8, 1.2),
            visual_size: (0.02, 0.04),
            ecc_h,
            ecc_v,
            respawns: Respawns::Count(1),
            upper_hemisphere_only: false,
            log_trajectory: true,
            destinations: Vec::new(),
            jump: None,
            bounds: None,
        }
    }

    #[test]
    fn aim_point_preserves_distance() {
        let frame = SpawnFrame::new(Vec3::new(1.0, 2.0, 3.0), 0.4);
        for (yaw, pitch) in [(0.0, 0.0), (15.0, -8.0), (-30.0, 12.0)] {
            let p = aim_point(&frame, yaw, pitch, 2.5);
            assert!(((p - frame.origin).length() - 2.5).abs() < 1e-4);
        }
    }

    #[test]
    fn zero_eccentricity_faces_the_heading() {
        let frame = SpawnFrame::new(Vec3::ZERO, 0.0);
        let p = aim_point(&frame, 0.0, 0.0, 3.0);
        assert!((p - Vec3::new(0.0, 0.0, -3.0)).length() < 1e-5);
    }

    #[test]
    fn player_relative_placement_stays_within_eccentricity_bounds() {
        let frame = SpawnFrame::new(Vec3::ZERO, 0.0);
        let spec = spec((5.0, 15.0), (2.0, 8.0));
        let mut rng = StdRng::seed_from_u64(11);

        let mut saw_left = false;
        let mut saw_right = false;
        for _ in 0..200 {
            let p = place_target(&mut rng, &spec, &frame, 1.0);
            // Recover yaw and pitch from the placed direction.
            let yaw = (-p.x).atan2(-p.z).to_degrees().abs();
            let pitch = p.y.asin().to_degrees().abs();
            assert!((5.0 - 1e-3..=15.0 + 1e-3).contains(&yaw), "yaw {yaw}");
            assert!((2.0 - 1e-3..=8.0 + 1e-3).contains(&pitch), "pitch {pitch}");
            if p.x > 0.0 {
                saw_right = true;
            } else {
                saw_left = true;
            }
        }
        // Sign flips must actually occur on both axes.
        assert!(saw_left && saw_right);
    }

    #[test]
    fn world_space_placement_samples_inside_bounds() {
        let frame = SpawnFrame::new(Vec3::ZERO, 0.0);
        let mut s = spec((5.0, 15.0), (2.0, 8.0));
        s.destination_space = DestinationSpace::World;
        s.bounds = Some(WorldBounds {
            min: Vec3::new(-1.0, 0.0, -5.0),
            max: Vec3::new(1.0, 2.0, -3.0),
        });
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let p = place_target(&mut rng, &s, &frame, 1.0);
            assert!((-1.0..=1.0).contains(&p.x));
            assert!((0.0..=2.0).contains(&p.y));
            assert!((-5.0..=-3.0).contains(&p.z));
        }
    }

    #[test]
    fn trial_spawns_carry_names_and_pick_motion_kinds() {
        let frame = SpawnFrame::new(Vec3::ZERO, 0.0);
        let mut waypointed = spec((5.0, 10.0), (1.0, 2.0));
        waypointed.destinations = vec![Vec3::ZERO, Vec3::new(0.0, 1.0, -2.0)];
        waypointed.name = "s_0_t1_1".into();
        let mut jumper = spec((5.0, 10.0), (1.0, 2.0));
        jumper.jump = Some(JumpParams {
            jump_period: (1.0, 2.0),
            jump_speed: (3.0, 5.0),
            gravity: (9.0, 10.0),
        });
        jumper.name = "s_0_t2_2".into();
        let condition = Condition {
            name: "mixed".into(),
            targets: vec![spec((5.0, 10.0), (1.0, 2.0)), waypointed, jumper],
            trial_count: 1,
        };

        let mut rng = StdRng::seed_from_u64(9);
        let commands = trial_spawns(&mut rng, &condition, &frame, 1.5, [0, 255, 0, 255]);
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0].name, "s_0_t0_0");
        assert_eq!(commands[0].index, 0);
        assert_eq!(commands[0].motion, MotionKind::Flying);
        assert_eq!(commands[1].index, 1);
        assert!(matches!(commands[1].motion, MotionKind::Waypoints(ref w) if w.len() == 2));
        assert!(matches!(commands[2].motion, MotionKind::Jumping(_)));
        for command in &commands {
            assert!((0.02..=0.04).contains(&command.size));
        }
    }

    #[test]
    fn reference_target_is_motionless_and_unlogged() {
        let frame = SpawnFrame::new(Vec3::ZERO, 0.0);
        let command = reference_spawn(&frame, 2.0, &ReferenceTarget::default());
        assert_eq!(command.speed, (0.0, 0.0));
        assert_eq!(command.name, "reference");
        assert!(!command.log_trajectory);
        assert!((command.position - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-5);
    }
}
