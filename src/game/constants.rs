//! Simulation tuning constants.
//! Config defaults and tests read these instead of repeating literals.

/// Physics stepping and gravity constants
pub mod physics {
    /// Fallback gravity magnitude in m/s², applied along world -Y
    pub const DEFAULT_GRAVITY: f32 = 9.82;

    /// Fixed engine sub-step (60 Hz)
    pub const TIMESTEP: f32 = 1.0 / 60.0;

    /// Maximum engine sub-steps per rendered frame
    pub const MAX_SUBSTEPS: u32 = 3;

    /// Largest frame delta fed to the simulation after a stall
    pub const MAX_FRAME_DELTA: f32 = 0.1;

    /// Below this length a vector is treated as zero
    pub const EPSILON: f32 = 1.0e-6;
}

/// Player defaults
pub mod player {
    /// Walk speed in m/s
    pub const WALK_SPEED: f32 = 5.0;

    /// Sprint speed in m/s
    pub const SPRINT_SPEED: f32 = 10.0;

    /// Vertical speed set by a jump, m/s
    pub const JUMP_IMPULSE: f32 = 7.0;

    /// Radians of yaw/pitch per raw mouse unit
    pub const MOUSE_SENSITIVITY: f32 = 0.002;

    /// Raw look deltas are clamped to ±this before use
    pub const MAX_LOOK_DELTA: f32 = 50.0;

    /// Camera offset along local up
    pub const EYE_HEIGHT: f32 = 0.5;

    pub const MASS: f32 = 5.0;

    /// Ball collider radius
    pub const RADIUS: f32 = 0.5;

    pub const LINEAR_DAMPING: f32 = 0.1;

    /// |velocity · up| below this counts as grounded
    pub const GROUNDED_THRESHOLD: f32 = 0.1;
}

/// Safety-net bounds
pub mod bounds {
    /// Spawn transform used on reset
    pub const SPAWN_POSITION: [f32; 3] = [0.0, 30.0, 0.0];

    /// World-Y below which the player is considered lost in the void
    pub const VOID_THRESHOLD: f32 = -50.0;
}

/// Gameplay props
pub mod props {
    /// Trigger distance from the pad center
    pub const JUMP_PAD_RADIUS: f32 = 2.0;
    /// Sensor disc size
    pub const JUMP_PAD_DISC_RADIUS: f32 = 1.5;
    pub const JUMP_PAD_DISC_HALF_HEIGHT: f32 = 0.1;
    pub const JUMP_PAD_LAUNCH_SPEED: f32 = 20.0;
    /// Tangential speed multiplier on launch
    pub const JUMP_PAD_BOOST: f32 = 1.5;
    pub const JUMP_PAD_COOLDOWN_SECS: f64 = 1.0;

    /// Seconds for a full back-and-forth cycle
    pub const PLATFORM_PERIOD_SECS: f32 = 5.0;
    pub const PLATFORM_HALF_EXTENTS: [f32; 3] = [2.0, 0.25, 2.0];

    pub const SHARD_RADIUS: f32 = 0.5;
    pub const SHARD_COLLECT_DISTANCE: f32 = 1.5;
}
