//! Local basis derived from the gravity direction.
//!
//! Everything here is rebuilt from scratch each frame: `up` is a function of
//! where the body is in the gravity field, so nothing is integrated across
//! frames and there is no accumulated drift.

use std::f32::consts::{FRAC_PI_2, PI};

use nalgebra::{Unit, UnitQuaternion, Vector3};

use super::constants::physics as consts;

/// Cross products shorter than this are treated as parallel.
const PARALLEL_EPSILON_SQ: f32 = 1.0e-12;

/// Unit vector opposite `gravity`. Zero or non-finite gravity has no
/// direction, so canonical up is returned instead.
pub fn up_from_gravity(gravity: &Vector3<f32>) -> Vector3<f32> {
    let magnitude = gravity.norm();
    if magnitude.is_finite() && magnitude > consts::EPSILON {
        -gravity / magnitude
    } else {
        Vector3::y()
    }
}

/// Minimal rotation taking canonical up `(0, 1, 0)` onto `up`.
///
/// The cross-product axis vanishes when `up` is antiparallel to canonical up;
/// in that case the rotation is a half turn about X, which is orthogonal to
/// canonical up.
pub fn align_rotation(up: &Vector3<f32>) -> UnitQuaternion<f32> {
    let canonical = Vector3::y();
    let cos_angle = canonical.dot(up).clamp(-1.0, 1.0);
    let axis = canonical.cross(up);

    if axis.norm_squared() <= PARALLEL_EPSILON_SQ {
        if cos_angle >= 0.0 {
            UnitQuaternion::identity()
        } else {
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI)
        }
    } else {
        UnitQuaternion::from_axis_angle(&Unit::new_normalize(axis), cos_angle.acos())
    }
}

/// Rotation about canonical up by `yaw`.
pub fn yaw_rotation(yaw: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw)
}

/// Body-local look rotation: yaw about Y first, then pitch about the yawed X
/// axis (YXZ order).
pub fn look_rotation(yaw: f32, pitch: f32) -> UnitQuaternion<f32> {
    yaw_rotation(yaw) * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), pitch)
}

/// Clamp pitch to straight up / straight down.
pub fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-FRAC_PI_2, FRAC_PI_2)
}

/// Movement/camera basis for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationFrame {
    pub up: Vector3<f32>,
    pub forward: Vector3<f32>,
    pub right: Vector3<f32>,
    pub align: UnitQuaternion<f32>,
}

impl OrientationFrame {
    /// Builds the basis for `up` (re-normalized; degenerate input falls back
    /// to canonical up) and a yaw angle.
    pub fn new(up: &Vector3<f32>, yaw: f32) -> Self {
        let up = up_from_gravity(&-up);
        let align = align_rotation(&up);
        let yaw_rot = yaw_rotation(yaw);

        Self {
            up,
            forward: align * (yaw_rot * -Vector3::z()),
            right: align * (yaw_rot * Vector3::x()),
            align,
        }
    }

    /// World-space camera orientation: the body-local look rotation is applied
    /// first, then the alignment to local up.
    pub fn camera_rotation(&self, yaw: f32, pitch: f32) -> UnitQuaternion<f32> {
        self.align * look_rotation(yaw, pitch)
    }
}
