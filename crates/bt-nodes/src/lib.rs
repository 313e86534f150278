//! Behavior tree nodes built on `bt-core`.
//!
//! Action, condition and decorator nodes share one guarded lifecycle
//! (`initialize`, `on_start`, `update`, `on_finished`, `on_abort`). Their
//! configuration is exposed through [`ParameterSet`] descriptors, node types
//! are published by name in a [`NodeRegistry`], and [`Tree`] is a reference
//! walker that drives the lifecycle with sequences, selectors and reactive
//! condition priorities.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod builtin;
pub mod node;
pub mod params;
pub mod registry;
pub mod walker;

pub use builtin::{
    register_builtins, AgentBlackboard, BlackboardBoolCondition, CounterLimitDecorator,
    MoveToEntityAction, SetBoolAction, WaitAction,
};
pub use node::{
    ActionNode, ConditionNode, DecoratorNode, LifecycleError, LifecycleState, Node, NodeCategory,
    NodeKind, PriorityType, Status,
};
pub use params::{
    FieldDescriptor, FieldTag, NoParams, ParamError, ParamMap, ParameterFieldInfo, ParameterSet,
};
pub use registry::{NodeRegistry, NodeSpec, Registration, RegistryError};
pub use walker::{BuildError, Composite, Tree, TreeNode, TreeSpec};
