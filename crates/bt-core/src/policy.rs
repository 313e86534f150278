use crate::{Blackboard, Engine, OwnerId, TickContext};

/// Decision logic a [`crate::Brain`] runs on its think ticks.
pub trait Policy: 'static {
    fn tick(
        &mut self,
        ctx: &TickContext,
        owner: OwnerId,
        engine: &mut dyn Engine,
        blackboard: &mut Blackboard,
    );

    /// Cancel whatever is running. Must leave the policy restartable.
    fn stop(
        &mut self,
        _ctx: &TickContext,
        _owner: OwnerId,
        _engine: &mut dyn Engine,
        _blackboard: &mut Blackboard,
    ) {
    }
}
