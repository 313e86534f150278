use crate::EntityId;

pub type Vec3 = [f32; 3];

/// Services the host engine provides to running nodes.
///
/// The core does not implement any of these; it only resolves ids through
/// them on demand. Scene queries default to "nothing there" so headless hosts
/// only implement what their nodes need.
pub trait Engine {
    /// Seconds elapsed during the current frame.
    fn delta_time(&self) -> f32;

    fn is_alive(&self, entity: EntityId) -> bool;

    fn entity_name(&self, _entity: EntityId) -> Option<String> {
        None
    }

    fn has_tag(&self, _entity: EntityId, _tag: &str) -> bool {
        false
    }

    fn find_entity_by_name(&self, _name: &str) -> Option<EntityId> {
        None
    }

    fn translation(&self, _entity: EntityId) -> Option<Vec3> {
        None
    }

    /// Returns `false` when the entity could not be moved.
    fn set_translation(&mut self, _entity: EntityId, _translation: Vec3) -> bool {
        false
    }

    fn destroy_entity(&mut self, _entity: EntityId) -> bool {
        false
    }
}

/// Engine with a fixed frame time and no entities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NullEngine {
    pub dt_seconds: f32,
}

impl Default for NullEngine {
    fn default() -> Self {
        Self {
            dt_seconds: 1.0 / 60.0,
        }
    }
}

impl Engine for NullEngine {
    fn delta_time(&self) -> f32 {
        self.dt_seconds
    }

    fn is_alive(&self, _entity: EntityId) -> bool {
        false
    }
}
