use crate::{Blackboard, Engine, OwnerId, Policy, TickContext};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How often a brain thinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BrainConfig {
    pub think_every_ticks: u32,
    pub think_offset_ticks: u32,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            think_every_ticks: 1,
            think_offset_ticks: 0,
        }
    }
}

impl BrainConfig {
    /// Spread agents over the `think_every_ticks` window by their stable id.
    pub fn deterministic(owner: OwnerId, think_every_ticks: u32) -> Self {
        let every = think_every_ticks.max(1);
        let offset = (owner.stable_id() % (every as u64)) as u32;
        Self {
            think_every_ticks: every,
            think_offset_ticks: offset,
        }
    }

    pub fn should_think(&self, tick: u64) -> bool {
        let every = self.think_every_ticks.max(1) as u64;
        tick.wrapping_add(self.think_offset_ticks as u64) % every == 0
    }
}

/// One agent: its owner id, its exclusively-owned blackboard and its policy.
pub struct Brain {
    pub owner: OwnerId,
    pub config: BrainConfig,
    pub blackboard: Blackboard,
    pub policy: Box<dyn Policy>,
}

impl Brain {
    pub fn new(owner: OwnerId, mut blackboard: Blackboard, policy: Box<dyn Policy>) -> Self {
        blackboard.bind_owner(owner);
        Self {
            owner,
            config: BrainConfig::default(),
            blackboard,
            policy,
        }
    }

    pub fn with_config(mut self, config: BrainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tick(&mut self, ctx: &TickContext, engine: &mut dyn Engine) {
        if !self.config.should_think(ctx.tick) {
            return;
        }
        self.policy
            .tick(ctx, self.owner, engine, &mut self.blackboard);
    }

    pub fn stop(&mut self, ctx: &TickContext, engine: &mut dyn Engine) {
        self.policy
            .stop(ctx, self.owner, engine, &mut self.blackboard);
    }
}

/// Tick every brain in stable owner order.
pub fn tick_brains(ctx: &TickContext, engine: &mut dyn Engine, brains: &mut [Brain]) {
    brains.sort_by_key(|b| b.owner.stable_id());
    for brain in brains.iter_mut() {
        brain.tick(ctx, engine);
    }
}
