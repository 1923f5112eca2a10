use nalgebra::Vector3;
use rapier3d::prelude::RigidBodyHandle;

use crate::game::constants::props as consts;
use crate::game::physics::{BodyDesc, BodyKind, BodyShape, PhysicsWorld};

/// Collectible crystal backed by a static sensor ball.
#[derive(Debug, Clone)]
pub struct Skyshard {
    position: Vector3<f32>,
    body: RigidBodyHandle,
}

impl Skyshard {
    pub fn new(world: &mut PhysicsWorld, position: Vector3<f32>) -> Self {
        let body = world.add_body(
            BodyDesc::new(
                BodyKind::Static,
                BodyShape::Ball {
                    radius: consts::SHARD_RADIUS,
                },
                position.into(),
            )
            .sensor(),
        );
        Self { position, body }
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn in_reach(&self, point: &Vector3<f32>) -> bool {
        (point - self.position).norm() < consts::SHARD_COLLECT_DISTANCE
    }

    /// Removes the sensor body from the world.
    pub fn collect(self, world: &mut PhysicsWorld) {
        world.remove_body(self.body);
    }
}
