use std::f32::consts::TAU;

use nalgebra::Vector3;
use rapier3d::prelude::RigidBodyHandle;

use crate::game::constants::props as consts;
use crate::game::physics::{BodyDesc, BodyKind, BodyShape, PhysicsWorld};

/// Kinematic box swinging between two points on a sine wave.
#[derive(Debug, Clone)]
pub struct MovingPlatform {
    start: Vector3<f32>,
    end: Vector3<f32>,
    period: f32,
    body: RigidBodyHandle,
}

impl MovingPlatform {
    pub fn new(world: &mut PhysicsWorld, start: Vector3<f32>, end: Vector3<f32>, period: f32) -> Self {
        let body = world.add_body(BodyDesc::new(
            BodyKind::Kinematic,
            BodyShape::Cuboid {
                half_extents: consts::PLATFORM_HALF_EXTENTS,
            },
            start.into(),
        ));
        let period = if period.is_finite() && period > 0.0 {
            period
        } else {
            consts::PLATFORM_PERIOD_SECS
        };
        Self {
            start,
            end,
            period,
            body,
        }
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    /// Where the platform should be at `time`.
    pub fn position_at(&self, time: f64) -> Vector3<f32> {
        let phase = (time / f64::from(self.period)).fract() as f32;
        let t = ((phase * TAU).sin() + 1.0) / 2.0;
        self.start.lerp(&self.end, t)
    }

    /// Sets the kinematic target for the next engine step.
    pub fn update(&self, time: f64, world: &mut PhysicsWorld) -> Vector3<f32> {
        let target = self.position_at(time);
        world.set_kinematic_target(self.body, target);
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).norm() < 1.0e-4
    }

    #[test]
    fn test_position_follows_sine() {
        let mut world = PhysicsWorld::new();
        let start = Vector3::new(0.0, 10.0, 0.0);
        let end = Vector3::new(20.0, 10.0, 0.0);
        let platform = MovingPlatform::new(&mut world, start, end, 4.0);

        // sin(0) = 0 -> halfway.
        assert!(approx(platform.position_at(0.0), Vector3::new(10.0, 10.0, 0.0)));
        // Quarter period -> end.
        assert!(approx(platform.position_at(1.0), end));
        // Three quarters -> start.
        assert!(approx(platform.position_at(3.0), start));
        // Periodic.
        assert!(approx(platform.position_at(41.0), end));
    }

    #[test]
    fn test_bad_period_uses_default() {
        let mut world = PhysicsWorld::new();
        let platform = MovingPlatform::new(&mut world, Vector3::zeros(), Vector3::x(), 0.0);
        assert_eq!(platform.period(), consts::PLATFORM_PERIOD_SECS);
    }

    #[test]
    fn test_update_moves_kinematic_body() {
        let mut world = PhysicsWorld::new();
        let start = Vector3::new(0.0, 0.0, 0.0);
        let end = Vector3::new(0.0, 0.0, 8.0);
        let platform = MovingPlatform::new(&mut world, start, end, 8.0);

        let target = platform.update(2.0, &mut world);
        assert!(approx(target, end));
        world.step(1.0 / 60.0);
        assert!(approx(world.position(platform.body()).unwrap(), end));
    }
}
