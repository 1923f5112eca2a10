use nalgebra::Vector3;
use thiserror::Error;

use super::constants::physics as consts;
use super::orientation::up_from_gravity;

/// Rejected well registration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("gravity well radius must be positive and finite, got {0}")]
    InvalidRadius(f32),
    #[error("gravity well at {0:?} has a non-finite position")]
    NonFinitePosition([f32; 3]),
    #[error("gravity well strength must be finite")]
    NonFiniteStrength,
}

/// What a well does to bodies inside its radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WellKind {
    /// Pulls toward the center (positive force) or pushes away (negative).
    Point { force: f32 },
    /// Constant acceleration regardless of where inside the sphere.
    Uniform { acceleration: Vector3<f32> },
    /// Zero gravity.
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GravityWell {
    position: Vector3<f32>,
    radius: f32,
    kind: WellKind,
}

impl GravityWell {
    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn kind(&self) -> WellKind {
        self.kind
    }

    /// Distance test is inclusive: a point exactly on the shell is inside.
    pub fn contains(&self, point: &Vector3<f32>) -> bool {
        (self.position - point).norm_squared() <= self.radius * self.radius
    }

    fn acceleration_at(&self, point: &Vector3<f32>) -> Vector3<f32> {
        match self.kind {
            WellKind::Point { force } => {
                let to_center = self.position - point;
                let distance = to_center.norm();
                if distance <= consts::EPSILON {
                    // Direction is undefined at the center.
                    Vector3::zeros()
                } else {
                    to_center / distance * force
                }
            }
            WellKind::Uniform { acceleration } => acceleration,
            WellKind::Null => Vector3::zeros(),
        }
    }
}

/// Ordered gravity wells plus a fallback vector.
///
/// Lookups scan wells in registration order and the first well containing
/// the query point wins outright. Overlapping wells are never blended, so the
/// field is discontinuous at well boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct GravityField {
    wells: Vec<GravityWell>,
    global_gravity: Vector3<f32>,
}

impl GravityField {
    /// Empty field with the default fallback of 9.82 m/s² along world -Y.
    pub fn new() -> Self {
        Self::with_global_gravity(Vector3::new(0.0, -consts::DEFAULT_GRAVITY, 0.0))
    }

    pub fn with_global_gravity(global_gravity: Vector3<f32>) -> Self {
        Self {
            wells: Vec::new(),
            global_gravity,
        }
    }

    pub fn global_gravity(&self) -> Vector3<f32> {
        self.global_gravity
    }

    pub fn wells(&self) -> &[GravityWell] {
        &self.wells
    }

    /// Registers a point well. Registration order is the overlap tie-break.
    pub fn add_well(
        &mut self,
        position: Vector3<f32>,
        force: f32,
        radius: f32,
    ) -> Result<(), ConfigurationError> {
        self.add_zone(position, radius, WellKind::Point { force })
    }

    /// Registers a well of any kind.
    pub fn add_zone(
        &mut self,
        position: Vector3<f32>,
        radius: f32,
        kind: WellKind,
    ) -> Result<(), ConfigurationError> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(ConfigurationError::InvalidRadius(radius));
        }
        if !position.iter().all(|c| c.is_finite()) {
            return Err(ConfigurationError::NonFinitePosition([
                position.x, position.y, position.z,
            ]));
        }
        let finite_strength = match kind {
            WellKind::Point { force } => force.is_finite(),
            WellKind::Uniform { acceleration } => acceleration.iter().all(|c| c.is_finite()),
            WellKind::Null => true,
        };
        if !finite_strength {
            return Err(ConfigurationError::NonFiniteStrength);
        }

        self.wells.push(GravityWell {
            position,
            radius,
            kind,
        });
        Ok(())
    }

    /// The well that governs `position`, if any.
    pub fn active_well(&self, position: &Vector3<f32>) -> Option<&GravityWell> {
        self.wells.iter().find(|well| well.contains(position))
    }

    /// Gravitational acceleration at `position`.
    pub fn query_acceleration(&self, position: &Vector3<f32>) -> Vector3<f32> {
        match self.active_well(position) {
            Some(well) => well.acceleration_at(position),
            None => self.global_gravity,
        }
    }

    /// Unit up vector at `position`, opposite the local gravity.
    pub fn up_at(&self, position: &Vector3<f32>) -> Vector3<f32> {
        up_from_gravity(&self.query_acceleration(position))
    }
}

impl Default for GravityField {
    fn default() -> Self {
        Self::new()
    }
}
