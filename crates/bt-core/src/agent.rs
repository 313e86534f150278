use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque identifier of the agent a tree runs for.
///
/// Nodes only ever store this id. Whatever engine state it refers to is
/// looked up through [`crate::Engine`] on demand, so a despawned owner is
/// observed as "gone" instead of as a dangling handle.
///
/// `0` is reserved for "no owner".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OwnerId(pub u64);

impl OwnerId {
    pub const NONE: OwnerId = OwnerId(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Stable numeric id used for ordering and logs.
    pub fn stable_id(self) -> u64 {
        self.0
    }

    /// The entity this owner id names, if any.
    pub fn entity(self) -> Option<EntityId> {
        (!self.is_none()).then_some(EntityId(self.0))
    }
}

impl From<u64> for OwnerId {
    fn from(value: u64) -> Self {
        OwnerId(value)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

/// Engine-side entity handle (what the blackboard's `Handle` kind stores).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityId(pub u64);

impl EntityId {
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Interpret a raw blackboard handle; `0` means "no entity".
    pub fn from_handle(handle: u64) -> Option<Self> {
        (handle != 0).then_some(EntityId(handle))
    }
}

impl From<EntityId> for u64 {
    fn from(value: EntityId) -> Self {
        value.0
    }
}
