use crate::{Blackboard, Engine, EntityId, OwnerId, TickContext};

/// Everything a node may touch during one lifecycle call.
///
/// Built by the tree walker for every call; nodes never keep it. The owner is
/// kept as an id and resolved through the engine each time it is asked for.
pub struct NodeContext<'a> {
    pub tick: TickContext,
    owner: OwnerId,
    pub blackboard: &'a mut Blackboard,
    pub engine: &'a mut dyn Engine,
}

impl<'a> NodeContext<'a> {
    pub fn new(
        tick: TickContext,
        owner: OwnerId,
        blackboard: &'a mut Blackboard,
        engine: &'a mut dyn Engine,
    ) -> Self {
        Self {
            tick,
            owner,
            blackboard,
            engine,
        }
    }

    pub fn owner_id(&self) -> OwnerId {
        self.owner
    }

    /// The owner entity, if it is set and still alive.
    pub fn owner(&self) -> Option<EntityId> {
        let entity = self.owner.entity()?;
        self.engine.is_alive(entity).then_some(entity)
    }

    pub fn delta_time(&self) -> f32 {
        self.engine.delta_time()
    }

    /// Shorter-lived context over the same borrows, for calls into children.
    pub fn reborrow(&mut self) -> NodeContext<'_> {
        NodeContext {
            tick: self.tick,
            owner: self.owner,
            blackboard: &mut *self.blackboard,
            engine: &mut *self.engine,
        }
    }
}
