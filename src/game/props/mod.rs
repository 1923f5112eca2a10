//! Gameplay props placed in the world by configuration.

pub mod jump_pad;
pub mod moving_platform;
pub mod skyshard;

pub use jump_pad::JumpPad;
pub use moving_platform::MovingPlatform;
pub use skyshard::Skyshard;

use nalgebra::Vector3;
use rapier3d::prelude::RigidBodyHandle;
use serde::Serialize;
use tracing::info;

use super::physics::PhysicsWorld;

/// What the props did to the player this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PropEvents {
    pub launched: bool,
    pub shards_collected: u32,
}

/// Every prop in the level.
#[derive(Debug, Clone, Default)]
pub struct PropSet {
    pub jump_pads: Vec<JumpPad>,
    pub platforms: Vec<MovingPlatform>,
    pub shards: Vec<Skyshard>,
    collected: u32,
}

impl PropSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shards collected since the level started.
    pub fn collected(&self) -> u32 {
        self.collected
    }

    pub fn shards_remaining(&self) -> usize {
        self.shards.len()
    }

    /// Platforms first, then pads, then shard pickup.
    pub fn update(
        &mut self,
        time: f64,
        world: &mut PhysicsWorld,
        player: RigidBodyHandle,
        up: &Vector3<f32>,
    ) -> PropEvents {
        let mut events = PropEvents::default();

        for platform in &self.platforms {
            platform.update(time, world);
        }

        for pad in &mut self.jump_pads {
            events.launched |= pad.update(time, world, player, up);
        }

        let Some(player_position) = world.position(player) else {
            return events;
        };
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.shards)
            .into_iter()
            .partition(|shard| shard.in_reach(&player_position));
        self.shards = kept;
        for shard in taken {
            let at = shard.position();
            shard.collect(world);
            self.collected += 1;
            events.shards_collected += 1;
            info!(shard = ?at, total = self.collected, "skyshard collected");
        }

        events
    }
}
