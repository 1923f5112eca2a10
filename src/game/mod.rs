//! Local-gravity simulation: gravity field, physics integration, player
//! controller and props.

pub mod clock;
pub mod constants;
pub mod gravity;
pub mod input;
pub mod integrator;
pub mod orientation;
pub mod physics;
pub mod player_controller;
pub mod player_movement;
pub mod props;
pub mod simulation;

pub use clock::FrameClock;
pub use gravity::{ConfigurationError, GravityField, GravityWell, WellKind};
pub use input::{InputIntent, InputSource, KeyboardState, ScriptedInput};
pub use integrator::{PhysicsIntegrator, StepReport};
pub use orientation::OrientationFrame;
pub use physics::PhysicsWorld;
pub use player_controller::{BoundsStatus, CameraTransform, PlayerController};
pub use simulation::{FrameReport, Simulation, Snapshot};
