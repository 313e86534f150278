//! Blackboard store, agent binding and engine services for tick-driven behavior trees.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod blackboard;
pub mod brain;
pub mod context;
pub mod engine;
pub mod policy;
pub mod tick;
pub mod value;

pub use agent::{EntityId, OwnerId};
pub use blackboard::{Blackboard, BlackboardTemplate, ChangeObserver};
pub use brain::{tick_brains, Brain, BrainConfig};
pub use context::NodeContext;
pub use engine::{Engine, NullEngine, Vec3};
pub use policy::Policy;
pub use tick::TickContext;
pub use value::{BlackboardValue, Value, ValueKind};
