//! Simulation configuration parsing from sim.toml files

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::game::constants::{physics as physics_consts, props as props_consts};
use crate::game::gravity::{ConfigurationError, GravityField, WellKind};
use crate::game::input::ScriptSegment;
use crate::game::player_controller::{BoundsSettings, PlayerSettings};

/// File name looked up by [`SimConfig::from_dir`]
pub const CONFIG_FILE_NAME: &str = "sim.toml";

/// Stepping section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed engine sub-step in seconds
    pub fixed_timestep: f32,
    /// Sub-steps allowed per frame
    pub max_substeps: u32,
    /// Frame deltas are clamped to this many seconds
    pub max_frame_delta: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: physics_consts::TIMESTEP,
            max_substeps: physics_consts::MAX_SUBSTEPS,
            max_frame_delta: physics_consts::MAX_FRAME_DELTA,
        }
    }
}

/// One `[[gravity.wells]]` entry, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WellConfig {
    Point {
        position: [f32; 3],
        radius: f32,
        force: f32,
    },
    Uniform {
        position: [f32; 3],
        radius: f32,
        acceleration: [f32; 3],
    },
    Null {
        position: [f32; 3],
        radius: f32,
    },
}

impl WellConfig {
    pub fn position(&self) -> Vector3<f32> {
        match self {
            WellConfig::Point { position, .. }
            | WellConfig::Uniform { position, .. }
            | WellConfig::Null { position, .. } => Vector3::from(*position),
        }
    }

    pub fn radius(&self) -> f32 {
        match self {
            WellConfig::Point { radius, .. }
            | WellConfig::Uniform { radius, .. }
            | WellConfig::Null { radius, .. } => *radius,
        }
    }

    pub fn kind(&self) -> WellKind {
        match self {
            WellConfig::Point { force, .. } => WellKind::Point { force: *force },
            WellConfig::Uniform { acceleration, .. } => WellKind::Uniform {
                acceleration: Vector3::from(*acceleration),
            },
            WellConfig::Null { .. } => WellKind::Null,
        }
    }
}

/// Gravity section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityConfig {
    /// Fallback acceleration outside every well
    pub global: [f32; 3],
    /// Registration order is the overlap tie-break
    pub wells: Vec<WellConfig>,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            global: [0.0, -physics_consts::DEFAULT_GRAVITY, 0.0],
            wells: Vec::new(),
        }
    }
}

impl GravityConfig {
    /// Build the field, registering wells in file order.
    pub fn build_field(&self) -> Result<GravityField, ConfigurationError> {
        let mut field = GravityField::with_global_gravity(Vector3::from(self.global));
        for well in &self.wells {
            field.add_zone(well.position(), well.radius(), well.kind())?;
        }
        Ok(field)
    }
}

/// Static box in the level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockConfig {
    pub position: [f32; 3],
    pub half_extents: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpPadConfig {
    pub position: [f32; 3],
    #[serde(default = "default_launch_speed")]
    pub launch_speed: f32,
}

fn default_launch_speed() -> f32 {
    props_consts::JUMP_PAD_LAUNCH_SPEED
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub start: [f32; 3],
    pub end: [f32; 3],
    /// Seconds per full back-and-forth cycle
    #[serde(default = "default_platform_period")]
    pub period: f32,
}

fn default_platform_period() -> f32 {
    props_consts::PLATFORM_PERIOD_SECS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardConfig {
    pub position: [f32; 3],
}

/// Simulation configuration from sim.toml
///
/// Every section is optional; an empty file gives an empty level with
/// default gravity and player tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub physics: PhysicsConfig,
    pub gravity: GravityConfig,
    pub player: PlayerSettings,
    pub bounds: BoundsSettings,
    pub blocks: Vec<BlockConfig>,
    pub jump_pads: Vec<JumpPadConfig>,
    pub moving_platforms: Vec<PlatformConfig>,
    pub skyshards: Vec<ShardConfig>,
    /// Input segments replayed by headless runs
    pub script: Vec<ScriptSegment>,
}

impl SimConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: SimConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory
    /// Looks for sim.toml in the given directory
    pub fn from_dir(dir: &Path) -> Result<Self, ConfigError> {
        Self::from_file(&dir.join(CONFIG_FILE_NAME))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject settings the simulation cannot run with. Well geometry is
    /// checked separately when the gravity field is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let physics = &self.physics;
        if !(physics.fixed_timestep > 0.0 && physics.fixed_timestep.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "physics.fixed_timestep must be positive, got {}",
                physics.fixed_timestep
            )));
        }
        if physics.max_substeps == 0 {
            return Err(ConfigError::Invalid(
                "physics.max_substeps must be at least 1".to_string(),
            ));
        }
        if !(physics.max_frame_delta > 0.0 && physics.max_frame_delta.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "physics.max_frame_delta must be positive, got {}",
                physics.max_frame_delta
            )));
        }
        if !(self.player.mass > 0.0 && self.player.mass.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "player.mass must be positive, got {}",
                self.player.mass
            )));
        }
        if !(self.player.radius > 0.0 && self.player.radius.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "player.radius must be positive, got {}",
                self.player.radius
            )));
        }
        if !self.bounds.spawn.iter().all(|c| c.is_finite()) {
            return Err(ConfigError::Invalid(
                "bounds.spawn must be finite".to_string(),
            ));
        }
        if let Some(block) = self
            .blocks
            .iter()
            .find(|b| b.half_extents.iter().any(|h| !(*h > 0.0)))
        {
            return Err(ConfigError::Invalid(format!(
                "block at {:?} has non-positive half extents",
                block.position
            )));
        }
        Ok(())
    }

    /// Starter level written by `skyshard init`: a start island, a small
    /// planet with its own well, and one of each prop.
    pub fn sample() -> Self {
        use crate::game::input::{InputIntent, LookDelta, MoveAxes};

        let walk = InputIntent {
            movement: MoveAxes { x: 0.0, z: -1.0 },
            ..Default::default()
        };
        Self {
            gravity: GravityConfig {
                wells: vec![WellConfig::Point {
                    position: [0.0, 0.0, -80.0],
                    radius: 30.0,
                    force: 20.0,
                }],
                ..Default::default()
            },
            blocks: vec![
                BlockConfig {
                    position: [0.0, 0.0, 0.0],
                    half_extents: [10.0, 1.0, 10.0],
                },
                BlockConfig {
                    position: [0.0, 0.0, -80.0],
                    half_extents: [8.0, 8.0, 8.0],
                },
            ],
            jump_pads: vec![JumpPadConfig {
                position: [0.0, 1.2, -6.0],
                launch_speed: props_consts::JUMP_PAD_LAUNCH_SPEED,
            }],
            moving_platforms: vec![PlatformConfig {
                start: [15.0, 2.0, 0.0],
                end: [35.0, 2.0, 0.0],
                period: props_consts::PLATFORM_PERIOD_SECS,
            }],
            skyshards: vec![ShardConfig {
                position: [4.0, 2.5, 0.0],
            }],
            script: vec![
                ScriptSegment {
                    frames: 120,
                    intent: InputIntent::default(),
                },
                ScriptSegment {
                    frames: 90,
                    intent: walk,
                },
                ScriptSegment {
                    frames: 30,
                    intent: InputIntent {
                        look: LookDelta { dx: 20.0, dy: 0.0 },
                        ..walk
                    },
                },
                ScriptSegment {
                    frames: 1,
                    intent: InputIntent {
                        jump: true,
                        ..walk
                    },
                },
            ],
            ..Default::default()
        }
    }
}

/// Errors that can occur when loading simulation configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Gravity(#[from] ConfigurationError),
}
