//! Umbrella crate that re-exports the `bt-*` building blocks.
//!
//! Start with [`prelude`]: it pulls in the blackboard, the node traits, the
//! registry and the reference tree walker.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use bt_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use bt_tools as tools;

#[cfg(feature = "nodes")]
#[cfg_attr(docsrs, doc(cfg(feature = "nodes")))]
pub use bt_nodes as nodes;

#[cfg(all(feature = "core", feature = "nodes"))]
#[cfg_attr(docsrs, doc(cfg(all(feature = "core", feature = "nodes"))))]
pub mod prelude {
    pub use bt_core::{
        Blackboard, BlackboardTemplate, Brain, BrainConfig, Engine, EntityId, NodeContext,
        OwnerId, Policy, TickContext, Value, ValueKind,
    };
    pub use bt_nodes::{
        register_builtins, ActionNode, ConditionNode, DecoratorNode, FieldDescriptor, Node,
        NodeCategory, NodeRegistry, NodeSpec, ParamError, ParameterSet, PriorityType, Status, Tree,
        TreeNode, TreeSpec,
    };
}
