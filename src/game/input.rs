//! Polled player input.
//!
//! Device events are folded into [`KeyboardState`] as they arrive; the frame
//! loop then takes exactly one [`InputIntent`] snapshot per update through
//! [`InputSource::poll`]. A snapshot is a plain value, so later events never
//! change one that was already handed out.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::constants::player as player_consts;

/// Movement axes, each in [-1, 1]. `z` is negative for forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveAxes {
    pub x: f32,
    pub z: f32,
}

/// Raw look delta in device units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookDelta {
    pub dx: f32,
    pub dy: f32,
}

impl LookDelta {
    /// Clamped to ±[`player_consts::MAX_LOOK_DELTA`]; non-finite components become 0.
    pub fn clamped(self) -> Self {
        Self {
            dx: clamp_finite(self.dx, player_consts::MAX_LOOK_DELTA),
            dy: clamp_finite(self.dy, player_consts::MAX_LOOK_DELTA),
        }
    }
}

/// One frame of player intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputIntent {
    pub movement: MoveAxes,
    pub jump: bool,
    pub sprint: bool,
    pub look: LookDelta,
}

impl InputIntent {
    /// Movement clamped to [-1, 1] and look delta clamped; NaN/inf become 0.
    pub fn sanitized(self) -> Self {
        Self {
            movement: MoveAxes {
                x: clamp_finite(self.movement.x, 1.0),
                z: clamp_finite(self.movement.z, 1.0),
            },
            look: self.look.clamped(),
            ..self
        }
    }
}

fn clamp_finite(value: f32, limit: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-limit, limit)
    } else {
        0.0
    }
}

/// Anything that can hand the frame loop an input snapshot.
pub trait InputSource {
    fn poll(&mut self) -> InputIntent;
}

/// Physical keys the controller cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    ShiftLeft,
    ShiftRight,
}

/// Key and mouse state fed by device events.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    held: HashSet<Key>,
    pending_look: LookDelta,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.remove(&key);
    }

    /// Accumulates relative mouse motion until the next poll. Each event is
    /// clamped on its own so one spike (pointer lock, slow frame) cannot
    /// dominate the frame.
    pub fn mouse_motion(&mut self, dx: f32, dy: f32) {
        let event = LookDelta { dx, dy }.clamped();
        self.pending_look.dx += event.dx;
        self.pending_look.dy += event.dy;
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    fn any_down(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.held.contains(k))
    }

    /// Current intent without draining the mouse accumulator.
    pub fn intent(&self) -> InputIntent {
        let forward = self.any_down(&[Key::W, Key::ArrowUp]);
        let backward = self.any_down(&[Key::S, Key::ArrowDown]);
        let left = self.any_down(&[Key::A, Key::ArrowLeft]);
        let right = self.any_down(&[Key::D, Key::ArrowRight]);

        InputIntent {
            movement: MoveAxes {
                x: axis(right, left),
                z: axis(backward, forward),
            },
            jump: self.is_down(Key::Space),
            sprint: self.any_down(&[Key::ShiftLeft, Key::ShiftRight]),
            look: self.pending_look.clamped(),
        }
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    f32::from(u8::from(positive)) - f32::from(u8::from(negative))
}

impl InputSource for KeyboardState {
    fn poll(&mut self) -> InputIntent {
        let intent = self.intent();
        self.pending_look = LookDelta::default();
        intent
    }
}

/// A span of frames holding one intent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptSegment {
    pub frames: u32,
    #[serde(flatten)]
    pub intent: InputIntent,
}

/// Replays fixed segments for headless runs. Idle once exhausted.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    segments: VecDeque<ScriptSegment>,
}

impl ScriptedInput {
    pub fn new(segments: impl IntoIterator<Item = ScriptSegment>) -> Self {
        Self {
            segments: segments.into_iter().filter(|s| s.frames > 0).collect(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.segments.is_empty()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> InputIntent {
        let Some(segment) = self.segments.front_mut() else {
            return InputIntent::default();
        };
        let intent = segment.intent;
        segment.frames -= 1;
        if segment.frames == 0 {
            self.segments.pop_front();
        }
        intent
    }
}
