use nalgebra::Vector3;
use serde::Serialize;
use tracing::{error, trace};

use super::constants::physics as consts;
use super::gravity::GravityField;
use super::physics::PhysicsWorld;

/// What one integrator step did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Dynamic bodies that received a gravity force.
    pub dynamic_bodies: usize,
    /// Fixed engine sub-steps actually run.
    pub substeps: u32,
    /// Dynamic bodies taken out of the engine this frame for non-finite state.
    pub quarantined: usize,
}

/// Feeds the gravity field into the rigid-body engine once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsIntegrator {
    fixed_timestep: f32,
    max_substeps: u32,
}

impl PhysicsIntegrator {
    pub fn new(fixed_timestep: f32, max_substeps: u32) -> Self {
        Self {
            fixed_timestep,
            max_substeps,
        }
    }

    pub fn fixed_timestep(&self) -> f32 {
        self.fixed_timestep
    }

    pub fn max_substeps(&self) -> u32 {
        self.max_substeps
    }

    /// Adds `acceleration * mass` to the force of every dynamic body.
    ///
    /// All forces are accumulated before any stepping happens. A body whose
    /// position is non-finite matches no well and gets the fallback.
    pub fn apply_gravity(&self, world: &mut PhysicsWorld, field: &GravityField) -> usize {
        let bodies = world.dynamic_bodies();
        for &handle in &bodies {
            let (Some(position), Some(mass)) = (world.position(handle), world.mass(handle)) else {
                continue;
            };
            let acceleration: Vector3<f32> = field.query_acceleration(&position);
            world.add_force(handle, acceleration * mass);
        }
        bodies.len()
    }

    /// Disables every dynamic body whose pose or velocity is non-finite.
    /// The engine cannot step such a body; the rest of the world still steps.
    pub fn quarantine_non_finite(&self, world: &mut PhysicsWorld) -> usize {
        let mut quarantined = 0;
        for handle in world.dynamic_bodies() {
            if world.is_finite(handle) == Some(false) {
                error!(
                    ?handle,
                    position = ?world.position(handle),
                    velocity = ?world.velocity(handle),
                    "dynamic body state is non-finite, quarantining"
                );
                if world.quarantine_body(handle) {
                    quarantined += 1;
                }
            }
        }
        quarantined
    }

    /// One frame: quarantine, gravity forces, then a single fixed-step engine call.
    pub fn step(&self, dt: f32, world: &mut PhysicsWorld, field: &GravityField) -> StepReport {
        let quarantined = self.quarantine_non_finite(world);
        let dynamic_bodies = self.apply_gravity(world, field);
        let substeps = world.step_fixed(self.fixed_timestep, dt, self.max_substeps);
        trace!(dt, dynamic_bodies, substeps, quarantined, "physics step");
        StepReport {
            dynamic_bodies,
            substeps,
            quarantined,
        }
    }
}

impl Default for PhysicsIntegrator {
    fn default() -> Self {
        Self::new(consts::TIMESTEP, consts::MAX_SUBSTEPS)
    }
}
