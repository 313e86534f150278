use core::fmt;

use bt_core::{Blackboard, NodeContext, OwnerId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::params::{ParamError, ParamMap, ParameterSet};

/// Per-tick or terminal outcome of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Status {
    Running,
    Success,
    Failure,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Running)
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            Status::Success
        } else {
            Status::Failure
        }
    }
}

/// Whether a condition may interrupt running work when it is re-evaluated.
///
/// Pure metadata for the walker; conditions never read it themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PriorityType {
    #[default]
    None,
    /// Failing aborts the branch this condition guards.
    SelfOnly,
    /// Succeeding aborts a running lower-priority sibling branch.
    LowerPriority,
    Both,
}

impl PriorityType {
    pub fn aborts_self(self) -> bool {
        matches!(self, PriorityType::SelfOnly | PriorityType::Both)
    }

    pub fn aborts_lower_priority(self) -> bool {
        matches!(self, PriorityType::LowerPriority | PriorityType::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeCategory {
    Action,
    Condition,
    Decorator,
    Blackboard,
}

impl NodeCategory {
    pub const ALL: [NodeCategory; 4] = [
        NodeCategory::Action,
        NodeCategory::Condition,
        NodeCategory::Decorator,
        NodeCategory::Blackboard,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NodeCategory::Action => "action",
            NodeCategory::Condition => "condition",
            NodeCategory::Decorator => "decorator",
            NodeCategory::Blackboard => "blackboard",
        }
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("node `{node}` was used before initialize")]
    NotInitialized { node: String },

    #[error("node `{node}` is not running")]
    NotStarted { node: String },

    #[error("node `{node}` is already running")]
    AlreadyStarted { node: String },

    #[error("node `{node}` has no terminal status to finish with")]
    NotFinished { node: String },

    #[error("node `{node}` already reached a terminal status and must be finished")]
    FinishPending { node: String },

    #[error("decorator `{node}` got a result while its child is still running")]
    ChildStillRunning { node: String },

    #[error("{kind} node `{node}` does not support {operation}")]
    Unsupported {
        node: String,
        kind: NodeCategory,
        operation: &'static str,
    },
}

/// Leaf that may span several ticks.
pub trait ActionNode: 'static {
    fn parameters(&self) -> &dyn ParameterSet;
    fn parameters_mut(&mut self) -> &mut dyn ParameterSet;

    /// One-time setup once the node is bound to its agent.
    fn on_initialize(&mut self, _owner: OwnerId, _blackboard: &mut Blackboard) {}

    fn on_start(&mut self, _ctx: &mut NodeContext<'_>) {}

    fn update(&mut self, ctx: &mut NodeContext<'_>) -> Status;

    fn on_finished(&mut self, _ctx: &mut NodeContext<'_>) {}

    /// Must leave the node ready for a later `on_start`.
    fn on_abort(&mut self, _ctx: &mut NodeContext<'_>) {}
}

/// Leaf predicate, evaluated within a single tick.
pub trait ConditionNode: 'static {
    fn parameters(&self) -> &dyn ParameterSet;
    fn parameters_mut(&mut self) -> &mut dyn ParameterSet;

    fn on_initialize(&mut self, _owner: OwnerId, _blackboard: &mut Blackboard) {}

    fn on_start(&mut self, _ctx: &mut NodeContext<'_>) {}

    fn check_condition(&mut self, ctx: &mut NodeContext<'_>) -> bool;

    fn on_finished(&mut self, _ctx: &mut NodeContext<'_>) {}

    fn on_abort(&mut self, _ctx: &mut NodeContext<'_>) {}
}

/// Gates and post-processes exactly one child.
pub trait DecoratorNode: 'static {
    fn parameters(&self) -> &dyn ParameterSet;
    fn parameters_mut(&mut self) -> &mut dyn ParameterSet;

    fn on_initialize(&mut self, _owner: OwnerId, _blackboard: &mut Blackboard) {}

    fn on_start(&mut self, _ctx: &mut NodeContext<'_>) {}

    /// Checked before the child is started. `false` skips the child for this
    /// cycle and reads as `Failure`.
    fn can_execute(&mut self, ctx: &mut NodeContext<'_>) -> bool;

    /// Sees, and may rewrite, the child's terminal status.
    fn on_finished_result(&mut self, _ctx: &mut NodeContext<'_>, _status: &mut Status) {}

    fn on_finished(&mut self, _ctx: &mut NodeContext<'_>) {}

    fn on_abort(&mut self, _ctx: &mut NodeContext<'_>) {}
}

pub enum NodeKind {
    Action(Box<dyn ActionNode>),
    Condition {
        node: Box<dyn ConditionNode>,
        priority: PriorityType,
    },
    Decorator(Box<dyn DecoratorNode>),
}

impl NodeKind {
    pub fn category(&self) -> NodeCategory {
        match self {
            NodeKind::Action(_) => NodeCategory::Action,
            NodeKind::Condition { .. } => NodeCategory::Condition,
            NodeKind::Decorator(_) => NodeCategory::Decorator,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Idle,
    Started,
}

/// One node instance plus the lifecycle guard around it.
///
/// Every call other than [`Node::initialize`] is checked against the current
/// [`LifecycleState`] and rejected with a [`LifecycleError`] when out of order;
/// the wrapped node never sees an invalid sequence.
pub struct Node {
    name: String,
    kind: NodeKind,
    owner: OwnerId,
    state: LifecycleState,
    last_status: Option<Status>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("category", &self.category())
            .field("priority", &self.priority())
            .field("owner", &self.owner)
            .field("state", &self.state)
            .field("last_status", &self.last_status)
            .field("parameters", &self.parameters())
            .finish()
    }
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            owner: OwnerId::NONE,
            state: LifecycleState::Uninitialized,
            last_status: None,
        }
    }

    pub fn action(name: impl Into<String>, node: impl ActionNode) -> Self {
        Self::new(name, NodeKind::Action(Box::new(node)))
    }

    pub fn condition(name: impl Into<String>, node: impl ConditionNode) -> Self {
        Self::new(
            name,
            NodeKind::Condition {
                node: Box::new(node),
                priority: PriorityType::None,
            },
        )
    }

    pub fn decorator(name: impl Into<String>, node: impl DecoratorNode) -> Self {
        Self::new(name, NodeKind::Decorator(Box::new(node)))
    }

    /// Set the priority of a condition; ignored by other kinds.
    pub fn with_priority(mut self, priority: PriorityType) -> Self {
        self.set_priority(priority);
        self
    }

    pub fn set_priority(&mut self, value: PriorityType) {
        match &mut self.kind {
            NodeKind::Condition { priority, .. } => *priority = value,
            _ => tracing::warn!(
                node = self.name.as_str(),
                "priority type only applies to conditions"
            ),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn category(&self) -> NodeCategory {
        self.kind.category()
    }

    pub fn priority(&self) -> PriorityType {
        match &self.kind {
            NodeKind::Condition { priority, .. } => *priority,
            _ => PriorityType::None,
        }
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state != LifecycleState::Uninitialized
    }

    pub fn is_started(&self) -> bool {
        self.state == LifecycleState::Started
    }

    /// Status returned by the most recent `update`.
    pub fn last_status(&self) -> Option<Status> {
        self.last_status
    }

    pub fn parameters(&self) -> &dyn ParameterSet {
        match &self.kind {
            NodeKind::Action(node) => node.parameters(),
            NodeKind::Condition { node, .. } => node.parameters(),
            NodeKind::Decorator(node) => node.parameters(),
        }
    }

    pub fn parameters_mut(&mut self) -> &mut dyn ParameterSet {
        match &mut self.kind {
            NodeKind::Action(node) => node.parameters_mut(),
            NodeKind::Condition { node, .. } => node.parameters_mut(),
            NodeKind::Decorator(node) => node.parameters_mut(),
        }
    }

    /// Partial parameter update from a persisted map.
    pub fn set_parameters(&mut self, values: &ParamMap) -> Result<(), ParamError> {
        self.parameters_mut().deserialize(values)
    }

    /// Replace every tagged field with the values of `source`.
    ///
    /// `source` must declare exactly the same fields.
    pub fn rebind_parameters(&mut self, source: &dyn ParameterSet) -> Result<(), ParamError> {
        if source.fields() != self.parameters().fields() {
            return Err(ParamError::IncompatibleSet);
        }
        self.parameters_mut().deserialize(&source.serialize())
    }

    /// Bind the node to its agent and run one-time setup.
    ///
    /// Re-initializing a node drops whatever run was in progress.
    pub fn initialize(&mut self, owner: OwnerId, blackboard: &mut Blackboard) {
        if self.is_started() {
            tracing::warn!(
                node = self.name.as_str(),
                "initialize while running; the current run is discarded"
            );
        }
        self.owner = owner;
        match &mut self.kind {
            NodeKind::Action(node) => node.on_initialize(owner, blackboard),
            NodeKind::Condition { node, .. } => node.on_initialize(owner, blackboard),
            NodeKind::Decorator(node) => node.on_initialize(owner, blackboard),
        }
        self.state = LifecycleState::Idle;
        self.last_status = None;
        tracing::trace!(node = self.name.as_str(), owner = owner.0, "node initialized");
    }

    pub fn on_start(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LifecycleError> {
        match self.state {
            LifecycleState::Uninitialized => return Err(self.not_initialized()),
            LifecycleState::Started => {
                return Err(LifecycleError::AlreadyStarted {
                    node: self.name.clone(),
                })
            }
            LifecycleState::Idle => {}
        }
        self.check_owner(ctx);
        match &mut self.kind {
            NodeKind::Action(node) => node.on_start(ctx),
            NodeKind::Condition { node, .. } => node.on_start(ctx),
            NodeKind::Decorator(node) => node.on_start(ctx),
        }
        self.state = LifecycleState::Started;
        self.last_status = None;
        tracing::trace!(node = self.name.as_str(), tick = ctx.tick.tick, "node start");
        Ok(())
    }

    /// Actions run their own logic, conditions map their predicate to
    /// `Success`/`Failure`, decorators always report `Success`.
    pub fn update(&mut self, ctx: &mut NodeContext<'_>) -> Result<Status, LifecycleError> {
        self.require_started()?;
        let status = match &mut self.kind {
            NodeKind::Action(node) => node.update(ctx),
            NodeKind::Condition { node, .. } => Status::from_bool(node.check_condition(ctx)),
            NodeKind::Decorator(_) => Status::Success,
        };
        self.last_status = Some(status);
        Ok(status)
    }

    /// Only valid once `update` (or a decorator's `on_finished_result`)
    /// produced a terminal status in the current run.
    pub fn on_finished(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LifecycleError> {
        self.require_started()?;
        if !self.has_terminal_status() {
            return Err(LifecycleError::NotFinished {
                node: self.name.clone(),
            });
        }
        match &mut self.kind {
            NodeKind::Action(node) => node.on_finished(ctx),
            NodeKind::Condition { node, .. } => node.on_finished(ctx),
            NodeKind::Decorator(node) => node.on_finished(ctx),
        }
        self.state = LifecycleState::Idle;
        tracing::trace!(node = self.name.as_str(), status = ?self.last_status, "node finished");
        Ok(())
    }

    /// Cancel a running node. Aborting an idle node does nothing; a node with
    /// a terminal status is finished, not aborted.
    pub fn on_abort(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LifecycleError> {
        match self.state {
            LifecycleState::Uninitialized => return Err(self.not_initialized()),
            LifecycleState::Idle => return Ok(()),
            LifecycleState::Started => {}
        }
        if self.has_terminal_status() {
            return Err(LifecycleError::FinishPending {
                node: self.name.clone(),
            });
        }
        match &mut self.kind {
            NodeKind::Action(node) => node.on_abort(ctx),
            NodeKind::Condition { node, .. } => node.on_abort(ctx),
            NodeKind::Decorator(node) => node.on_abort(ctx),
        }
        self.state = LifecycleState::Idle;
        self.last_status = None;
        tracing::trace!(node = self.name.as_str(), "node aborted");
        Ok(())
    }

    /// Decorator gate. Errors for other kinds.
    pub fn can_execute(&mut self, ctx: &mut NodeContext<'_>) -> Result<bool, LifecycleError> {
        if !self.is_initialized() {
            return Err(self.not_initialized());
        }
        match &mut self.kind {
            NodeKind::Decorator(node) => Ok(node.can_execute(ctx)),
            kind => Err(LifecycleError::Unsupported {
                node: self.name.clone(),
                kind: kind.category(),
                operation: "can_execute",
            }),
        }
    }

    /// Let a decorator post-process its child's terminal status.
    pub fn on_finished_result(
        &mut self,
        ctx: &mut NodeContext<'_>,
        status: &mut Status,
    ) -> Result<(), LifecycleError> {
        if !self.is_initialized() {
            return Err(self.not_initialized());
        }
        if !status.is_terminal() {
            return Err(LifecycleError::ChildStillRunning {
                node: self.name.clone(),
            });
        }
        match &mut self.kind {
            NodeKind::Decorator(node) => {
                node.on_finished_result(ctx, status);
                self.last_status = Some(*status);
                Ok(())
            }
            kind => Err(LifecycleError::Unsupported {
                node: self.name.clone(),
                kind: kind.category(),
                operation: "on_finished_result",
            }),
        }
    }

    fn has_terminal_status(&self) -> bool {
        self.last_status.is_some_and(Status::is_terminal)
    }

    fn require_started(&self) -> Result<(), LifecycleError> {
        match self.state {
            LifecycleState::Uninitialized => Err(self.not_initialized()),
            LifecycleState::Idle => Err(LifecycleError::NotStarted {
                node: self.name.clone(),
            }),
            LifecycleState::Started => Ok(()),
        }
    }

    fn not_initialized(&self) -> LifecycleError {
        tracing::warn!(node = self.name.as_str(), "lifecycle call before initialize");
        LifecycleError::NotInitialized {
            node: self.name.clone(),
        }
    }

    fn check_owner(&self, ctx: &NodeContext<'_>) {
        if ctx.owner_id() != self.owner {
            tracing::warn!(
                node = self.name.as_str(),
                bound = self.owner.0,
                context = ctx.owner_id().0,
                "node ticked for an agent it is not bound to"
            );
        }
    }
}
