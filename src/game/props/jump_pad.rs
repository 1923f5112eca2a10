use nalgebra::Vector3;
use rapier3d::prelude::RigidBodyHandle;
use tracing::info;

use crate::game::constants::props as consts;
use crate::game::physics::{BodyDesc, BodyKind, BodyShape, PhysicsWorld};
use crate::game::player_movement::split_velocity;

/// Launches the player along local up when it comes close enough.
#[derive(Debug, Clone)]
pub struct JumpPad {
    position: Vector3<f32>,
    body: RigidBodyHandle,
    launch_speed: f32,
    boost: f32,
    cooldown: f64,
    last_triggered: Option<f64>,
}

impl JumpPad {
    /// Adds the pad's static sensor disc to the world.
    pub fn new(world: &mut PhysicsWorld, position: Vector3<f32>) -> Self {
        let body = world.add_body(
            BodyDesc::new(
                BodyKind::Static,
                BodyShape::Cylinder {
                    half_height: consts::JUMP_PAD_DISC_HALF_HEIGHT,
                    radius: consts::JUMP_PAD_DISC_RADIUS,
                },
                position.into(),
            )
            .sensor(),
        );
        Self {
            position,
            body,
            launch_speed: consts::JUMP_PAD_LAUNCH_SPEED,
            boost: consts::JUMP_PAD_BOOST,
            cooldown: consts::JUMP_PAD_COOLDOWN_SECS,
            last_triggered: None,
        }
    }

    pub fn with_launch_speed(mut self, launch_speed: f32) -> Self {
        self.launch_speed = launch_speed;
        self
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn last_triggered(&self) -> Option<f64> {
        self.last_triggered
    }

    fn ready(&self, time: f64) -> bool {
        match self.last_triggered {
            Some(last) => time - last > self.cooldown,
            None => true,
        }
    }

    /// Returns true when the player was launched this frame.
    pub fn update(
        &mut self,
        time: f64,
        world: &mut PhysicsWorld,
        player: RigidBodyHandle,
        up: &Vector3<f32>,
    ) -> bool {
        let (Some(position), Some(velocity)) = (world.position(player), world.velocity(player)) else {
            return false;
        };
        if (position - self.position).norm() >= consts::JUMP_PAD_RADIUS || !self.ready(time) {
            return false;
        }

        let (_, tangential) = split_velocity(&velocity, up);
        world.set_velocity(player, tangential * self.boost + up * self.launch_speed);
        self.last_triggered = Some(time);
        info!(pad = ?self.position, time, "jump pad launch");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (PhysicsWorld, JumpPad, RigidBodyHandle) {
        let mut world = PhysicsWorld::new();
        let pad = JumpPad::new(&mut world, Vector3::new(0.0, 0.0, 0.0));
        let player = world.add_body(BodyDesc::new(
            BodyKind::Dynamic,
            BodyShape::Ball { radius: 0.5 },
            [0.0, 1.0, 0.0],
        ));
        (world, pad, player)
    }

    #[test]
    fn test_launch_along_up_with_boost() {
        let (mut world, mut pad, player) = setup();
        world.set_velocity(player, Vector3::new(2.0, -1.0, 0.0));

        assert!(pad.update(0.0, &mut world, player, &Vector3::y()));
        let v = world.velocity(player).unwrap();
        assert!((v - Vector3::new(3.0, 20.0, 0.0)).norm() < 1.0e-4);
        assert_eq!(pad.last_triggered(), Some(0.0));
    }

    #[test]
    fn test_launch_follows_local_up() {
        let (mut world, mut pad, player) = setup();
        world.set_velocity(player, Vector3::new(0.0, 2.0, 0.0));

        assert!(pad.update(0.0, &mut world, player, &Vector3::x()));
        let v = world.velocity(player).unwrap();
        assert!((v - Vector3::new(20.0, 3.0, 0.0)).norm() < 1.0e-4);
    }

    #[test]
    fn test_cooldown() {
        let (mut world, mut pad, player) = setup();
        assert!(pad.update(10.0, &mut world, player, &Vector3::y()));
        assert!(!pad.update(10.5, &mut world, player, &Vector3::y()));
        assert!(!pad.update(11.0, &mut world, player, &Vector3::y()));
        assert!(pad.update(11.01, &mut world, player, &Vector3::y()));
    }

    #[test]
    fn test_out_of_range() {
        let (mut world, mut pad, player) = setup();
        world.set_position(player, Vector3::new(2.0, 0.0, 0.0));
        world.set_velocity(player, Vector3::new(1.0, 0.0, 0.0));

        assert!(!pad.update(0.0, &mut world, player, &Vector3::y()));
        assert_eq!(world.velocity(player).unwrap(), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(pad.last_triggered(), None);
    }
}
