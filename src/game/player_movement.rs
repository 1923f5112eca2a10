use nalgebra::Vector3;

use super::constants::physics as consts;
use super::constants::player as player_consts;
use super::input::{InputIntent, LookDelta};
use super::orientation::{clamp_pitch, OrientationFrame};

/// Speeds and thresholds for one controlled body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementTuning {
    pub speed: f32,
    pub sprint_speed: f32,
    pub jump_impulse: f32,
    pub grounded_threshold: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            speed: player_consts::WALK_SPEED,
            sprint_speed: player_consts::SPRINT_SPEED,
            jump_impulse: player_consts::JUMP_IMPULSE,
            grounded_threshold: player_consts::GROUNDED_THRESHOLD,
        }
    }
}

/// Per-frame velocity decision for the controlled body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityPlan {
    pub velocity: Vector3<f32>,
    pub move_direction: Vector3<f32>,
    pub grounded: bool,
    pub jumped: bool,
}

/// Integrate one look delta into yaw/pitch.
pub fn apply_look(yaw: f32, pitch: f32, delta: LookDelta, sensitivity: f32) -> (f32, f32) {
    let delta = delta.clamped();
    let yaw = yaw - delta.dx * sensitivity;
    let pitch = clamp_pitch(pitch - delta.dy * sensitivity);
    (yaw, pitch)
}

/// Split `velocity` into (along `up`, remainder).
pub fn split_velocity(velocity: &Vector3<f32>, up: &Vector3<f32>) -> (Vector3<f32>, Vector3<f32>) {
    let vertical = up * velocity.dot(up);
    (vertical, velocity - vertical)
}

/// Speed-based proxy for ground contact. A body sliding slowly along any
/// surface also counts.
pub fn is_grounded(velocity: &Vector3<f32>, up: &Vector3<f32>, threshold: f32) -> bool {
    velocity.dot(up).abs() < threshold
}

/// Unit movement direction in the local plane, or zero without input.
pub fn move_direction(frame: &OrientationFrame, intent: &InputIntent) -> Vector3<f32> {
    let axes = intent.movement;
    if axes.x == 0.0 && axes.z == 0.0 {
        return Vector3::zeros();
    }
    let raw = frame.right * axes.x - frame.forward * axes.z;
    let length = raw.norm();
    if length.is_finite() && length > consts::EPSILON {
        raw / length
    } else {
        Vector3::zeros()
    }
}

/// Velocity for this frame.
///
/// Tangential motion snaps to the input direction (or to zero with no input),
/// the vertical component is carried over, and a jump replaces the vertical
/// component with `up * jump_impulse` when the body is considered grounded.
pub fn plan_velocity(
    velocity: &Vector3<f32>,
    frame: &OrientationFrame,
    intent: &InputIntent,
    tuning: &MovementTuning,
) -> VelocityPlan {
    let up = frame.up;
    let direction = move_direction(frame, intent);
    let (vertical, _tangential) = split_velocity(velocity, &up);
    let grounded = is_grounded(velocity, &up, tuning.grounded_threshold);

    let tangential = if direction == Vector3::zeros() {
        Vector3::zeros()
    } else {
        let speed = if intent.sprint {
            tuning.sprint_speed
        } else {
            tuning.speed
        };
        direction * speed
    };

    let jumped = intent.jump && grounded;
    let vertical = if jumped { up * tuning.jump_impulse } else { vertical };

    VelocityPlan {
        velocity: tangential + vertical,
        move_direction: direction,
        grounded,
        jumped,
    }
}
