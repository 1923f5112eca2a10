use rapier3d::prelude::*;

use super::constants::physics as consts;

/// Body type tag as seen by the gravity integrator and controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Moved by forces; receives gravity.
    Dynamic,
    /// Moved by script (next-kinematic-translation); ignores gravity.
    Kinematic,
    /// Never moves.
    Static,
}

/// Collider shape for a new body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Ball { radius: f32 },
    Cuboid { half_extents: [f32; 3] },
    /// Axis along local Y.
    Cylinder { half_height: f32, radius: f32 },
}

/// Everything needed to create a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub shape: BodyShape,
    pub position: [f32; 3],
    /// Ignored for kinematic and static bodies.
    pub mass: f32,
    /// Sensors report overlaps but never push anything.
    pub sensor: bool,
    pub lock_rotations: bool,
    pub linear_damping: f32,
}

impl BodyDesc {
    pub fn new(kind: BodyKind, shape: BodyShape, position: [f32; 3]) -> Self {
        Self {
            kind,
            shape,
            position,
            mass: 1.0,
            sensor: false,
            lock_rotations: false,
            linear_damping: 0.0,
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn sensor(mut self) -> Self {
        self.sensor = true;
        self
    }

    pub fn with_locked_rotations(mut self) -> Self {
        self.lock_rotations = true;
        self
    }

    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }
}

fn build_collider(desc: &BodyDesc) -> Collider {
    let builder = match desc.shape {
        BodyShape::Ball { radius } => ColliderBuilder::ball(radius),
        BodyShape::Cuboid { half_extents: [hx, hy, hz] } => ColliderBuilder::cuboid(hx, hy, hz),
        BodyShape::Cylinder {
            half_height,
            radius,
        } => ColliderBuilder::cylinder(half_height, radius),
    };
    let builder = builder.sensor(desc.sensor);
    match desc.kind {
        BodyKind::Dynamic => builder.mass(desc.mass.max(consts::EPSILON)).build(),
        BodyKind::Kinematic | BodyKind::Static => builder.build(),
    }
}

/// Wrapper around the Rapier3D pipeline.
///
/// World gravity is kept at zero: gravity reaches dynamic bodies only as user
/// forces, accumulated each frame from the gravity field.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    /// Unconsumed frame time, always less than one fixed step after `step_fixed`.
    accumulator: f32,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            accumulator: 0.0,
        }
    }

    /// Runs exactly one engine step of `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &Vector::zeros(),
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Advances by `elapsed` seconds of frame time in fixed sub-steps.
    ///
    /// Frame time is banked; each bank of `fixed_dt` runs one engine step, up
    /// to `max_substeps` per call. Backlog beyond the cap is dropped (modulo
    /// `fixed_dt`). User forces are consumed by every sub-step of this call
    /// and cleared afterwards. Returns the number of sub-steps run.
    pub fn step_fixed(&mut self, fixed_dt: f32, elapsed: f32, max_substeps: u32) -> u32 {
        let mut substeps = 0;

        if elapsed.is_finite() && elapsed > 0.0 && fixed_dt > 0.0 {
            self.accumulator += elapsed;
            while self.accumulator >= fixed_dt && substeps < max_substeps {
                self.step(fixed_dt);
                self.accumulator -= fixed_dt;
                substeps += 1;
            }
            self.accumulator %= fixed_dt;
        }

        self.clear_forces();
        substeps
    }

    /// Frame time banked but not yet stepped.
    pub fn pending_time(&self) -> f32 {
        self.accumulator
    }

    /// Zeroes the user force accumulator on every body.
    pub fn clear_forces(&mut self) {
        for (_, body) in self.rigid_body_set.iter_mut() {
            body.reset_forces(false);
        }
    }

    /// Creates a body with one collider and returns its handle.
    pub fn add_body(&mut self, desc: BodyDesc) -> RigidBodyHandle {
        let [x, y, z] = desc.position;
        let builder = match desc.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_position_based(),
            BodyKind::Static => RigidBodyBuilder::fixed(),
        };
        let mut builder = builder
            .translation(vector![x, y, z])
            .linear_damping(desc.linear_damping);
        if desc.lock_rotations {
            builder = builder.lock_rotations();
        }
        let handle = self.rigid_body_set.insert(builder.build());

        let collider = build_collider(&desc);
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        // Make mass available before the first step so gravity forces use it.
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.recompute_mass_properties_from_colliders(&self.collider_set);
        }

        handle
    }

    /// Removes a body and its colliders. Returns false for unknown handles.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    pub fn contains(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn kind(&self, handle: RigidBodyHandle) -> Option<BodyKind> {
        self.rigid_body_set.get(handle).map(|body| {
            if body.is_dynamic() {
                BodyKind::Dynamic
            } else if body.is_kinematic() {
                BodyKind::Kinematic
            } else {
                BodyKind::Static
            }
        })
    }

    /// Handles of all enabled dynamic bodies, in set order.
    pub fn dynamic_bodies(&self) -> Vec<RigidBodyHandle> {
        self.rigid_body_set
            .iter()
            .filter(|(_, body)| body.is_dynamic() && body.is_enabled())
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Sets the translation a kinematic body reaches at the end of the next step.
    pub fn set_kinematic_target(&mut self, handle: RigidBodyHandle, position: Vector<Real>) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            if body.is_kinematic() {
                body.set_next_kinematic_translation(position);
            }
        }
    }

    /// True when pose and velocities are all finite. `None` for unknown handles.
    pub fn is_finite(&self, handle: RigidBodyHandle) -> Option<bool> {
        self.rigid_body_set.get(handle).map(|body| {
            let pose = body.position();
            pose.translation.vector.iter().all(|c| c.is_finite())
                && pose.rotation.coords.iter().all(|c| c.is_finite())
                && body.linvel().iter().all(|c| c.is_finite())
                && body.angvel().iter().all(|c| c.is_finite())
        })
    }

    /// Takes a body out of the simulation: parks it at the origin with no
    /// motion and disables it, so the engine never sees its bad state.
    /// `reset_body` brings it back.
    pub fn quarantine_body(&mut self, handle: RigidBodyHandle) -> bool {
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            return false;
        };
        body.set_position(Isometry::identity(), false);
        body.set_linvel(Vector::zeros(), false);
        body.set_angvel(Vector::zeros(), false);
        body.reset_forces(false);
        body.set_enabled(false);
        true
    }

    pub fn is_enabled(&self, handle: RigidBodyHandle) -> Option<bool> {
        self.rigid_body_set.get(handle).map(|body| body.is_enabled())
    }

    pub fn position(&self, handle: RigidBodyHandle) -> Option<Vector<Real>> {
        self.rigid_body_set.get(handle).map(|body| *body.translation())
    }

    pub fn set_position(&mut self, handle: RigidBodyHandle, position: Vector<Real>) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_translation(position, true);
        }
    }

    pub fn velocity(&self, handle: RigidBodyHandle) -> Option<Vector<Real>> {
        self.rigid_body_set.get(handle).map(|body| *body.linvel())
    }

    /// Sets the linear velocity of a dynamic body.
    pub fn set_velocity(&mut self, handle: RigidBodyHandle, velocity: Vector<Real>) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            if body.is_dynamic() {
                body.set_linvel(velocity, true);
            }
        }
    }

    pub fn mass(&self, handle: RigidBodyHandle) -> Option<f32> {
        self.rigid_body_set.get(handle).map(|body| body.mass())
    }

    /// Force accumulated since the last `step_fixed`.
    pub fn force(&self, handle: RigidBodyHandle) -> Option<Vector<Real>> {
        self.rigid_body_set.get(handle).map(|body| body.user_force())
    }

    /// Adds to the force accumulator of a dynamic body.
    pub fn add_force(&mut self, handle: RigidBodyHandle, force: Vector<Real>) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            if body.is_dynamic() {
                body.add_force(force, true);
            }
        }
    }

    /// Teleports a body, zeroes its linear and angular velocity and forces,
    /// and re-enables it if it was quarantined.
    pub fn reset_body(&mut self, handle: RigidBodyHandle, position: Vector<Real>) -> bool {
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            return false;
        };
        body.set_enabled(true);
        body.set_rotation(Rotation::identity(), true);
        body.set_translation(position, true);
        body.set_linvel(Vector::zeros(), true);
        body.set_angvel(Vector::zeros(), true);
        body.reset_forces(true);
        true
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
