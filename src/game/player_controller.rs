use nalgebra::{UnitQuaternion, Vector3};
use rapier3d::prelude::RigidBodyHandle;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::constants::{bounds as bounds_consts, player as player_consts};
use super::input::{InputIntent, LookDelta};
use super::orientation::OrientationFrame;
use super::physics::{BodyDesc, BodyKind, BodyShape, PhysicsWorld};
use super::player_movement::{apply_look, plan_velocity, MovementTuning, VelocityPlan};

/// Tuning for the controlled body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub speed: f32,
    pub sprint_speed: f32,
    pub jump_impulse: f32,
    pub mouse_sensitivity: f32,
    pub eye_height: f32,
    pub mass: f32,
    pub radius: f32,
    pub linear_damping: f32,
    pub grounded_threshold: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            speed: player_consts::WALK_SPEED,
            sprint_speed: player_consts::SPRINT_SPEED,
            jump_impulse: player_consts::JUMP_IMPULSE,
            mouse_sensitivity: player_consts::MOUSE_SENSITIVITY,
            eye_height: player_consts::EYE_HEIGHT,
            mass: player_consts::MASS,
            radius: player_consts::RADIUS,
            linear_damping: player_consts::LINEAR_DAMPING,
            grounded_threshold: player_consts::GROUNDED_THRESHOLD,
        }
    }
}

impl PlayerSettings {
    pub fn tuning(&self) -> MovementTuning {
        MovementTuning {
            speed: self.speed,
            sprint_speed: self.sprint_speed,
            jump_impulse: self.jump_impulse,
            grounded_threshold: self.grounded_threshold,
        }
    }
}

/// Where the player goes back to when lost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsSettings {
    pub spawn: [f32; 3],
    /// Checked against world Y, not local up.
    pub void_threshold: f32,
}

impl Default for BoundsSettings {
    fn default() -> Self {
        Self {
            spawn: bounds_consts::SPAWN_POSITION,
            void_threshold: bounds_consts::VOID_THRESHOLD,
        }
    }
}

impl BoundsSettings {
    pub fn spawn_position(&self) -> Vector3<f32> {
        Vector3::from(self.spawn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }
}

/// Outcome of the per-frame safety check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsStatus {
    InBounds,
    /// Position or velocity went NaN/inf; body was reset to spawn.
    RecoveredNonFinite,
    /// Body dropped below the void threshold; body was reset to spawn.
    FellIntoVoid,
    /// The body no longer exists in the world.
    Missing,
}

impl BoundsStatus {
    pub fn was_reset(self) -> bool {
        matches!(self, BoundsStatus::RecoveredNonFinite | BoundsStatus::FellIntoVoid)
    }
}

fn all_finite(v: &Vector3<f32>) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// First-person controller whose "up" follows local gravity.
///
/// The controller owns one dynamic ball body in the [`PhysicsWorld`] and
/// writes its velocity directly each frame. Orientation is never integrated:
/// the caller supplies the current up vector and the basis is rebuilt.
#[derive(Debug, Clone)]
pub struct PlayerController {
    body: RigidBodyHandle,
    settings: PlayerSettings,
    bounds: BoundsSettings,
    yaw: f32,
    pitch: f32,
    camera: CameraTransform,
    last_plan: Option<VelocityPlan>,
}

impl PlayerController {
    /// Creates the player body at the spawn point.
    pub fn spawn(world: &mut PhysicsWorld, settings: PlayerSettings, bounds: BoundsSettings) -> Self {
        let desc = BodyDesc::new(
            BodyKind::Dynamic,
            BodyShape::Ball {
                radius: settings.radius,
            },
            bounds.spawn,
        )
        .with_mass(settings.mass)
        .with_locked_rotations()
        .with_linear_damping(settings.linear_damping);
        let body = world.add_body(desc);

        Self {
            body,
            settings,
            bounds,
            yaw: 0.0,
            pitch: 0.0,
            camera: CameraTransform {
                position: bounds.spawn_position(),
                orientation: UnitQuaternion::identity(),
            },
            last_plan: None,
        }
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn bounds(&self) -> &BoundsSettings {
        &self.bounds
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn camera(&self) -> CameraTransform {
        self.camera
    }

    pub fn last_plan(&self) -> Option<&VelocityPlan> {
        self.last_plan.as_ref()
    }

    pub fn grounded(&self) -> bool {
        self.last_plan.map(|plan| plan.grounded).unwrap_or(false)
    }

    pub fn on_look(&mut self, delta: LookDelta) {
        let (yaw, pitch) = apply_look(self.yaw, self.pitch, delta, self.settings.mouse_sensitivity);
        self.yaw = yaw;
        self.pitch = pitch;
    }

    pub fn frame(&self, up: &Vector3<f32>) -> OrientationFrame {
        OrientationFrame::new(up, self.yaw)
    }

    /// Writes this frame's velocity to the body. `None` if the body is gone.
    pub fn update(
        &mut self,
        world: &mut PhysicsWorld,
        intent: &InputIntent,
        up: &Vector3<f32>,
    ) -> Option<VelocityPlan> {
        let velocity = world.velocity(self.body)?;
        let frame = self.frame(up);
        let plan = plan_velocity(&velocity, &frame, intent, &self.settings.tuning());
        world.set_velocity(self.body, plan.velocity);
        self.last_plan = Some(plan);
        Some(plan)
    }

    /// Places the camera at eye height along `up` and orients it: local look
    /// rotation first, alignment to `up` second.
    pub fn sync_camera(&mut self, world: &PhysicsWorld, up: &Vector3<f32>) -> CameraTransform {
        let frame = self.frame(up);
        if let Some(position) = world.position(self.body) {
            self.camera = CameraTransform {
                position: position + frame.up * self.settings.eye_height,
                orientation: frame.camera_rotation(self.yaw, self.pitch),
            };
        }
        self.camera
    }

    /// Resets the body to spawn when its state is non-finite or it fell
    /// below the void threshold.
    pub fn check_bounds(&mut self, world: &mut PhysicsWorld) -> BoundsStatus {
        let (Some(position), Some(velocity)) = (world.position(self.body), world.velocity(self.body))
        else {
            return BoundsStatus::Missing;
        };

        let status = if !all_finite(&position) || !all_finite(&velocity) {
            error!(
                ?position,
                ?velocity,
                "player state is non-finite, resetting to spawn"
            );
            BoundsStatus::RecoveredNonFinite
        } else if position.y < self.bounds.void_threshold {
            info!(
                y = position.y,
                threshold = self.bounds.void_threshold,
                "player fell into the void, respawning"
            );
            BoundsStatus::FellIntoVoid
        } else {
            return BoundsStatus::InBounds;
        };

        world.reset_body(self.body, self.bounds.spawn_position());
        self.last_plan = None;
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::input::MoveAxes;
    use std::f32::consts::FRAC_PI_2;

    const TOL: f32 = 1.0e-4;

    fn approx(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).norm() < TOL
    }

    fn spawn() -> (PhysicsWorld, PlayerController) {
        let mut world = PhysicsWorld::new();
        let player =
            PlayerController::spawn(&mut world, PlayerSettings::default(), BoundsSettings::default());
        (world, player)
    }

    #[test]
    fn test_spawn_places_dynamic_body() {
        let (world, player) = spawn();
        assert_eq!(world.kind(player.body()), Some(BodyKind::Dynamic));
        assert!(approx(
            world.position(player.body()).unwrap(),
            Vector3::new(0.0, 30.0, 0.0)
        ));
        assert!((world.mass(player.body()).unwrap() - 5.0).abs() < 1.0e-3);
    }

    #[test]
    fn test_update_writes_velocity() {
        let (mut world, mut player) = spawn();
        world.set_velocity(player.body(), Vector3::new(3.0, 4.0, 5.0));

        let plan = player
            .update(&mut world, &InputIntent::default(), &Vector3::y())
            .unwrap();

        assert!(approx(plan.velocity, Vector3::new(0.0, 4.0, 0.0)));
        assert!(approx(
            world.velocity(player.body()).unwrap(),
            Vector3::new(0.0, 4.0, 0.0)
        ));
        assert!(!player.grounded());
    }

    #[test]
    fn test_jump_sets_vertical_speed() {
        let (mut world, mut player) = spawn();
        world.set_velocity(player.body(), Vector3::new(0.0, 0.05, 0.0));
        let intent = InputIntent {
            jump: true,
            ..Default::default()
        };

        let plan = player.update(&mut world, &intent, &Vector3::y()).unwrap();
        assert!(plan.jumped);
        assert!((world.velocity(player.body()).unwrap().y - 7.0).abs() < TOL);
    }

    #[test]
    fn test_look_turns_movement() {
        let (mut world, mut player) = spawn();
        // Quarter turn to the left: yaw += π/2.
        for _ in 0..20 {
            player.on_look(LookDelta {
                dx: -FRAC_PI_2 / 0.002 / 20.0,
                dy: 0.0,
            });
        }
        assert!((player.yaw() - FRAC_PI_2).abs() < 1.0e-3);

        let intent = InputIntent {
            movement: MoveAxes { x: 0.0, z: -1.0 },
            ..Default::default()
        };
        let plan = player.update(&mut world, &intent, &Vector3::y()).unwrap();
        // Forward after a left quarter turn is world -X.
        assert!((plan.velocity - Vector3::new(-5.0, 0.0, 0.0)).norm() < 1.0e-2);
    }

    #[test]
    fn test_pitch_stays_clamped() {
        let (_world, mut player) = spawn();
        for _ in 0..100 {
            player.on_look(LookDelta { dx: 0.0, dy: -50.0 });
        }
        assert_eq!(player.pitch(), FRAC_PI_2);
        for _ in 0..200 {
            player.on_look(LookDelta { dx: 0.0, dy: 50.0 });
        }
        assert_eq!(player.pitch(), -FRAC_PI_2);
    }

    #[test]
    fn test_camera_sits_at_eye_height_along_up() {
        let (mut world, mut player) = spawn();
        world.set_position(player.body(), Vector3::new(0.0, 0.0, 10.0));

        let camera = player.sync_camera(&world, &Vector3::z());
        assert!(approx(camera.position, Vector3::new(0.0, 0.0, 10.5)));
        // Camera's local up follows the body's up.
        assert!(approx(camera.orientation * Vector3::y(), Vector3::z()));
        assert_eq!(player.camera(), camera);
    }

    #[test]
    fn test_nan_position_recovers_to_spawn() {
        let (mut world, mut player) = spawn();
        world.set_position(player.body(), Vector3::new(f32::NAN, 0.0, 0.0));
        world.set_velocity(player.body(), Vector3::new(1.0, 2.0, 3.0));

        assert_eq!(player.check_bounds(&mut world), BoundsStatus::RecoveredNonFinite);
        assert!(approx(
            world.position(player.body()).unwrap(),
            Vector3::new(0.0, 30.0, 0.0)
        ));
        assert_eq!(world.velocity(player.body()).unwrap(), Vector3::zeros());
    }

    #[test]
    fn test_nan_velocity_recovers_to_spawn() {
        let (mut world, mut player) = spawn();
        world.set_velocity(player.body(), Vector3::new(0.0, f32::INFINITY, 0.0));
        let status = player.check_bounds(&mut world);
        assert_eq!(status, BoundsStatus::RecoveredNonFinite);
        assert!(status.was_reset());
        assert_eq!(world.velocity(player.body()).unwrap(), Vector3::zeros());
    }

    #[test]
    fn test_void_uses_world_y() {
        let (mut world, mut player) = spawn();
        world.set_position(player.body(), Vector3::new(0.0, -60.0, 0.0));
        assert_eq!(player.check_bounds(&mut world), BoundsStatus::FellIntoVoid);
        assert!(approx(
            world.position(player.body()).unwrap(),
            Vector3::new(0.0, 30.0, 0.0)
        ));

        // Far along X is fine no matter what local up says.
        world.set_position(player.body(), Vector3::new(-500.0, -10.0, 0.0));
        assert_eq!(player.check_bounds(&mut world), BoundsStatus::InBounds);
    }

    #[test]
    fn test_missing_body() {
        let (mut world, mut player) = spawn();
        world.remove_body(player.body());
        assert_eq!(player.check_bounds(&mut world), BoundsStatus::Missing);
        assert!(player
            .update(&mut world, &InputIntent::default(), &Vector3::y())
            .is_none());
    }
}
