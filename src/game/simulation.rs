mod tick_pipeline;

use nalgebra::{Vector3, Vector4};
use serde::Serialize;
use tracing::debug;

use crate::config::{ConfigError, SimConfig};

use super::clock::FrameClock;
use super::gravity::GravityField;
use super::input::{InputIntent, InputSource};
use super::integrator::{PhysicsIntegrator, StepReport};
use super::physics::{BodyDesc, BodyKind, BodyShape, PhysicsWorld};
use super::player_controller::{BoundsStatus, PlayerController};
use super::props::{JumpPad, MovingPlatform, PropEvents, PropSet, Skyshard};

/// What happened during one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    /// Clamped delta actually simulated.
    pub dt: f32,
    pub step: StepReport,
    pub jumped: bool,
    pub grounded: bool,
    pub bounds: BoundsStatus,
    pub props: PropEvents,
}

/// Serializable view of the player after a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub frame: u64,
    pub elapsed: f64,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub up: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub grounded: bool,
    pub camera_position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    pub camera_orientation: [f32; 4],
    pub shards_collected: u32,
    pub shards_remaining: usize,
}

/// One level: physics world, gravity field, player and props.
pub struct Simulation {
    pub(crate) world: PhysicsWorld,
    pub(crate) field: GravityField,
    pub(crate) integrator: PhysicsIntegrator,
    pub(crate) player: PlayerController,
    pub(crate) props: PropSet,
    pub(crate) clock: FrameClock,
    /// Up vector at the player as of the last frame.
    pub(crate) up: Vector3<f32>,
}

impl Simulation {
    /// Builds a level from configuration. Bad wells fail the whole build.
    pub fn from_config(config: &SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let field = config.gravity.build_field()?;
        let mut world = PhysicsWorld::new();

        for block in &config.blocks {
            world.add_body(BodyDesc::new(
                BodyKind::Static,
                BodyShape::Cuboid {
                    half_extents: block.half_extents,
                },
                block.position,
            ));
        }

        let mut props = PropSet::new();
        for pad in &config.jump_pads {
            props.jump_pads.push(
                JumpPad::new(&mut world, Vector3::from(pad.position))
                    .with_launch_speed(pad.launch_speed),
            );
        }
        for platform in &config.moving_platforms {
            props.platforms.push(MovingPlatform::new(
                &mut world,
                Vector3::from(platform.start),
                Vector3::from(platform.end),
                platform.period,
            ));
        }
        for shard in &config.skyshards {
            props
                .shards
                .push(Skyshard::new(&mut world, Vector3::from(shard.position)));
        }

        let player = PlayerController::spawn(&mut world, config.player, config.bounds);
        let up = field.up_at(&config.bounds.spawn_position());

        debug!(
            wells = field.wells().len(),
            blocks = config.blocks.len(),
            jump_pads = props.jump_pads.len(),
            platforms = props.platforms.len(),
            shards = props.shards.len(),
            "simulation built"
        );

        Ok(Self {
            world,
            field,
            integrator: PhysicsIntegrator::new(
                config.physics.fixed_timestep,
                config.physics.max_substeps,
            ),
            player,
            props,
            clock: FrameClock::with_max_delta(config.physics.max_frame_delta),
            up,
        })
    }

    /// Advances one frame with the given intent and raw (unclamped) delta.
    pub fn frame(&mut self, intent: &InputIntent, raw_dt: f32) -> FrameReport {
        let dt = self.clock.advance(raw_dt);
        tick_pipeline::run_frame_phases(self, &intent.sanitized(), dt)
    }

    /// Polls `input` once and advances one frame.
    pub fn frame_from(&mut self, input: &mut impl InputSource, raw_dt: f32) -> FrameReport {
        let intent = input.poll();
        self.frame(&intent, raw_dt)
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn field(&self) -> &GravityField {
        &self.field
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn props(&self) -> &PropSet {
        &self.props
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn snapshot(&self) -> Snapshot {
        let body = self.player.body();
        let position = self.world.position(body).unwrap_or_else(Vector3::zeros);
        let velocity = self.world.velocity(body).unwrap_or_else(Vector3::zeros);
        let camera = self.player.camera();
        let q: Vector4<f32> = camera.orientation.coords;

        Snapshot {
            frame: self.clock.frames(),
            elapsed: self.clock.elapsed(),
            position: position.into(),
            velocity: velocity.into(),
            up: self.up.into(),
            yaw: self.player.yaw(),
            pitch: self.player.pitch(),
            grounded: self.player.grounded(),
            camera_position: camera.position.into(),
            camera_orientation: q.into(),
            shards_collected: self.props.collected(),
            shards_remaining: self.props.shards_remaining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlockConfig, ShardConfig, WellConfig};
    use crate::game::input::{LookDelta, MoveAxes, ScriptSegment, ScriptedInput};

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_empty_config_builds() {
        let sim = Simulation::from_config(&SimConfig::default()).unwrap();
        assert_eq!(sim.world().body_count(), 1);
        assert_eq!(sim.up(), Vector3::y());
        let snap = sim.snapshot();
        assert_eq!(snap.position, [0.0, 30.0, 0.0]);
        assert_eq!(snap.frame, 0);
    }

    #[test]
    fn test_bad_well_fails_build() {
        let mut config = SimConfig::default();
        config.gravity.wells.push(WellConfig::Point {
            position: [0.0; 3],
            radius: -1.0,
            force: 1.0,
        });
        assert!(matches!(
            Simulation::from_config(&config),
            Err(ConfigError::Gravity(_))
        ));
    }

    #[test]
    fn test_player_lands_on_block() {
        let mut config = SimConfig::default();
        config.bounds.spawn = [0.0, 3.0, 0.0];
        config.blocks.push(BlockConfig {
            position: [0.0, 0.0, 0.0],
            half_extents: [10.0, 1.0, 10.0],
        });
        let mut sim = Simulation::from_config(&config).unwrap();

        for _ in 0..180 {
            sim.frame(&InputIntent::default(), DT);
        }
        let last = sim.frame(&InputIntent::default(), DT);

        let y = sim.snapshot().position[1];
        assert!((y - 1.5).abs() < 0.1, "rest height {}", y);
        assert!(last.grounded);
        assert_eq!(last.bounds, BoundsStatus::InBounds);
    }

    #[test]
    fn test_look_is_applied_before_movement() {
        let mut sim = Simulation::from_config(&SimConfig::default()).unwrap();
        let intent = InputIntent {
            look: LookDelta { dx: 10.0, dy: -5.0 },
            movement: MoveAxes { x: 0.0, z: -1.0 },
            ..Default::default()
        };
        sim.frame(&intent, DT);
        assert!((sim.player().yaw() + 0.02).abs() < 1.0e-6);
        assert!((sim.player().pitch() - 0.01).abs() < 1.0e-6);

        // Forward with yaw = -0.02 points slightly toward +X.
        let v = sim.snapshot().velocity;
        assert!(v[0] > 0.0 && v[2] < -4.9);
    }

    #[test]
    fn test_void_respawn() {
        let mut config = SimConfig::default();
        config.bounds.void_threshold = 25.0;
        let mut sim = Simulation::from_config(&config).unwrap();

        let mut respawned = false;
        for _ in 0..120 {
            let report = sim.frame(&InputIntent::default(), DT);
            if report.bounds == BoundsStatus::FellIntoVoid {
                respawned = true;
                break;
            }
        }
        assert!(respawned);
        assert_eq!(sim.snapshot().position, [0.0, 30.0, 0.0]);
        assert_eq!(sim.snapshot().velocity, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_shard_collected_in_flight() {
        let mut config = SimConfig::default();
        config.skyshards.push(ShardConfig {
            position: [0.0, 29.0, 0.0],
        });
        let mut sim = Simulation::from_config(&config).unwrap();

        let mut collected = 0;
        for _ in 0..30 {
            collected += sim.frame(&InputIntent::default(), DT).props.shards_collected;
        }
        assert_eq!(collected, 1);
        assert_eq!(sim.snapshot().shards_collected, 1);
        assert_eq!(sim.snapshot().shards_remaining, 0);
    }

    #[test]
    fn test_frame_from_polls_once() {
        let mut sim = Simulation::from_config(&SimConfig::default()).unwrap();
        let mut script = ScriptedInput::new([ScriptSegment {
            frames: 2,
            intent: InputIntent {
                sprint: true,
                movement: MoveAxes { x: 1.0, z: 0.0 },
                ..Default::default()
            },
        }]);

        sim.frame_from(&mut script, DT);
        assert!(!script.is_exhausted());
        sim.frame_from(&mut script, DT);
        assert!(script.is_exhausted());
        assert!((sim.snapshot().velocity[0] - 10.0).abs() < 1.0e-3);
    }

    #[test]
    fn test_stalled_frame_is_clamped() {
        let mut sim = Simulation::from_config(&SimConfig::default()).unwrap();
        let report = sim.frame(&InputIntent::default(), 5.0);
        assert_eq!(report.dt, 0.1);
        assert_eq!(report.step.substeps, 3);
        assert_eq!(sim.clock().frames(), 1);
    }

    #[test]
    fn test_nan_player_between_frames_recovers() {
        let mut sim = Simulation::from_config(&SimConfig::default()).unwrap();
        for _ in 0..10 {
            sim.frame(&InputIntent::default(), DT);
        }
        let body = sim.player().body();
        sim.world_mut()
            .set_position(body, Vector3::new(f32::NAN, 0.0, 9.0));

        let report = sim.frame(&InputIntent::default(), DT);
        assert_eq!(report.bounds, BoundsStatus::RecoveredNonFinite);
        assert_eq!(report.step.quarantined, 0);

        let snap = sim.snapshot();
        assert!(snap.position.iter().all(|c| c.is_finite()));
        assert!(snap.camera_position.iter().all(|c| c.is_finite()));
        assert!((snap.position[1] - 30.0).abs() < 0.1);
        let eye = Vector3::from(snap.camera_position) - Vector3::from(snap.position);
        assert!((eye - Vector3::y() * sim.player().settings().eye_height).norm() < 1.0e-4);

        let report = sim.frame(&InputIntent::default(), DT);
        assert_eq!(report.bounds, BoundsStatus::InBounds);
    }

    #[test]
    fn test_camera_follows_reset_on_void_frame() {
        let mut config = SimConfig::default();
        config.bounds.void_threshold = 25.0;
        let mut sim = Simulation::from_config(&config).unwrap();

        loop {
            if sim.frame(&InputIntent::default(), DT).bounds == BoundsStatus::FellIntoVoid {
                break;
            }
            assert!(sim.clock().frames() < 120);
        }
        let camera = sim.player().camera().position;
        let expected = Vector3::new(0.0, 30.0, 0.0) + Vector3::y() * sim.player().settings().eye_height;
        assert!((camera - expected).norm() < 1.0e-4, "camera {:?}", camera);
    }

    #[test]
    fn test_broken_prop_body_does_not_stop_the_frame() {
        let mut sim = Simulation::from_config(&SimConfig::default()).unwrap();
        let crate_body = sim.world_mut().add_body(BodyDesc::new(
            BodyKind::Dynamic,
            BodyShape::Cuboid { half_extents: [0.5, 0.5, 0.5] },
            [5.0, 10.0, 0.0],
        ));
        sim.world_mut()
            .set_position(crate_body, Vector3::new(0.0, f32::INFINITY, 0.0));

        let report = sim.frame(&InputIntent::default(), DT);
        assert_eq!(report.step.quarantined, 1);
        assert_eq!(report.step.dynamic_bodies, 1);
        assert_eq!(report.bounds, BoundsStatus::InBounds);
        assert_eq!(sim.world().is_enabled(crate_body), Some(false));

        // The player keeps falling under the fallback.
        for _ in 0..10 {
            sim.frame(&InputIntent::default(), DT);
        }
        assert!(sim.snapshot().velocity[1] < -1.0);
    }
}
