use bt_core::{Blackboard, Engine, NodeContext, OwnerId, Policy, TickContext};
use bt_tools::{NullTraceSink, TraceEvent, TraceSink};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::node::{LifecycleError, Node, NodeCategory, Status};
use crate::registry::{NodeRegistry, NodeSpec, RegistryError};

pub const TAG_START: &str = "bt.node.start";
pub const TAG_FINISH: &str = "bt.node.finish";
pub const TAG_ABORT: &str = "bt.node.abort";
pub const TAG_SKIP: &str = "bt.decorator.skip";
pub const TAG_INTERRUPT: &str = "bt.condition.interrupt";

/// Serialized tree shape; node references resolve through a [`NodeRegistry`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum TreeSpec {
    /// An action or condition leaf.
    Node(NodeSpec),
    Decorated {
        decorator: NodeSpec,
        child: Box<TreeSpec>,
    },
    Sequence {
        #[cfg_attr(feature = "serde", serde(default))]
        name: String,
        children: Vec<TreeSpec>,
    },
    Selector {
        #[cfg_attr(feature = "serde", serde(default))]
        name: String,
        children: Vec<TreeSpec>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("`{name}` is a {found} but this position takes {expected}")]
    WrongCategory {
        name: String,
        expected: &'static str,
        found: NodeCategory,
    },

    #[error("{kind} `{name}` has no children")]
    EmptyComposite { kind: &'static str, name: String },
}

/// Children ticked in order with a cursor on the running one.
#[derive(Debug)]
pub struct Composite {
    name: String,
    children: Vec<TreeNode>,
    current: usize,
    running: bool,
}

impl Composite {
    fn new(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            name: name.into(),
            children,
            current: 0,
            running: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// Index of the child the next tick resumes.
    pub fn current(&self) -> usize {
        self.current
    }

    fn reset(&mut self) {
        self.current = 0;
        self.running = false;
    }

    fn abort(
        &mut self,
        ctx: &mut NodeContext<'_>,
        trace: &mut dyn TraceSink,
    ) -> Result<(), LifecycleError> {
        if self.running {
            if let Some(child) = self.children.get_mut(self.current) {
                child.abort(ctx, trace)?;
            }
            emit(trace, ctx, TAG_ABORT, &self.name, self.current as u64);
        }
        self.reset();
        Ok(())
    }

    fn tick_sequence(
        &mut self,
        ctx: &mut NodeContext<'_>,
        trace: &mut dyn TraceSink,
    ) -> Result<Status, LifecycleError> {
        if self.running && ctx.blackboard.is_values_changed() {
            let mut interrupted = None;
            for child in self.children[..self.current].iter_mut() {
                let TreeNode::Leaf(condition) = child else {
                    continue;
                };
                if condition.category() != NodeCategory::Condition
                    || !condition.priority().aborts_self()
                {
                    continue;
                }
                if evaluate(condition, ctx)? == Status::Failure {
                    interrupted = Some(condition.name().to_string());
                    break;
                }
            }
            if let Some(name) = interrupted {
                emit(trace, ctx, TAG_INTERRUPT, &name, self.current as u64);
                self.abort(ctx, trace)?;
                return Ok(Status::Failure);
            }
        }

        self.running = true;
        while let Some(child) = self.children.get_mut(self.current) {
            match child.tick(ctx, trace)? {
                Status::Running => return Ok(Status::Running),
                Status::Failure => {
                    self.reset();
                    return Ok(Status::Failure);
                }
                Status::Success => self.current += 1,
            }
        }
        self.reset();
        Ok(Status::Success)
    }

    fn tick_selector(
        &mut self,
        ctx: &mut NodeContext<'_>,
        trace: &mut dyn TraceSink,
    ) -> Result<Status, LifecycleError> {
        if self.running && ctx.blackboard.is_values_changed() {
            let mut switch_to = None;
            for (index, child) in self.children[..self.current].iter_mut().enumerate() {
                let guards = child.leading_conditions();
                if !guards.iter().any(|g| g.priority().aborts_lower_priority()) {
                    continue;
                }
                let mut passed = true;
                for guard in guards {
                    if evaluate(guard, ctx)? != Status::Success {
                        passed = false;
                        break;
                    }
                }
                if passed {
                    switch_to = Some(index);
                    break;
                }
            }
            if let Some(index) = switch_to {
                let name = self.children[index].name().to_string();
                emit(trace, ctx, TAG_INTERRUPT, &name, index as u64);
                if let Some(running) = self.children.get_mut(self.current) {
                    running.abort(ctx, trace)?;
                }
                self.current = index;
            }
        }

        self.running = true;
        while let Some(child) = self.children.get_mut(self.current) {
            match child.tick(ctx, trace)? {
                Status::Running => return Ok(Status::Running),
                Status::Success => {
                    self.reset();
                    return Ok(Status::Success);
                }
                Status::Failure => self.current += 1,
            }
        }
        self.reset();
        Ok(Status::Failure)
    }
}

#[derive(Debug)]
pub enum TreeNode {
    /// Action or condition.
    Leaf(Node),
    Decorated {
        decorator: Node,
        child: Box<TreeNode>,
    },
    Sequence(Composite),
    Selector(Composite),
}

impl TreeNode {
    pub fn leaf(node: Node) -> Self {
        TreeNode::Leaf(node)
    }

    pub fn decorated(decorator: Node, child: TreeNode) -> Self {
        TreeNode::Decorated {
            decorator,
            child: Box::new(child),
        }
    }

    pub fn sequence(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        TreeNode::Sequence(Composite::new(name, children))
    }

    pub fn selector(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        TreeNode::Selector(Composite::new(name, children))
    }

    pub fn name(&self) -> &str {
        match self {
            TreeNode::Leaf(node) => node.name(),
            TreeNode::Decorated { decorator, .. } => decorator.name(),
            TreeNode::Sequence(c) | TreeNode::Selector(c) => c.name(),
        }
    }

    pub fn is_running(&self) -> bool {
        match self {
            TreeNode::Leaf(node) => node.is_started(),
            TreeNode::Decorated { decorator, .. } => decorator.is_started(),
            TreeNode::Sequence(c) | TreeNode::Selector(c) => c.running,
        }
    }

    /// First node named `name`, depth first.
    pub fn find(&self, name: &str) -> Option<&Node> {
        match self {
            TreeNode::Leaf(node) => (node.name() == name).then_some(node),
            TreeNode::Decorated { decorator, child } => {
                if decorator.name() == name {
                    Some(decorator)
                } else {
                    child.find(name)
                }
            }
            TreeNode::Sequence(c) | TreeNode::Selector(c) => {
                c.children.iter().find_map(|child| child.find(name))
            }
        }
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Node> {
        match self {
            TreeNode::Leaf(node) => (node.name() == name).then_some(node),
            TreeNode::Decorated { decorator, child } => {
                if decorator.name() == name {
                    Some(decorator)
                } else {
                    child.find_mut(name)
                }
            }
            TreeNode::Sequence(c) | TreeNode::Selector(c) => {
                c.children.iter_mut().find_map(|child| child.find_mut(name))
            }
        }
    }

    /// Number of lifecycle nodes (composites excluded).
    pub fn node_count(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 1,
            TreeNode::Decorated { child, .. } => 1 + child.node_count(),
            TreeNode::Sequence(c) | TreeNode::Selector(c) => {
                c.children.iter().map(TreeNode::node_count).sum()
            }
        }
    }

    pub fn initialize(&mut self, owner: OwnerId, blackboard: &mut Blackboard) {
        match self {
            TreeNode::Leaf(node) => node.initialize(owner, blackboard),
            TreeNode::Decorated { decorator, child } => {
                decorator.initialize(owner, blackboard);
                child.initialize(owner, blackboard);
            }
            TreeNode::Sequence(c) | TreeNode::Selector(c) => {
                c.reset();
                for child in c.children.iter_mut() {
                    child.initialize(owner, blackboard);
                }
            }
        }
    }

    pub fn tick(
        &mut self,
        ctx: &mut NodeContext<'_>,
        trace: &mut dyn TraceSink,
    ) -> Result<Status, LifecycleError> {
        match self {
            TreeNode::Leaf(node) => run_leaf(node, ctx, trace),
            TreeNode::Decorated { decorator, child } => {
                if !decorator.is_started() {
                    if !decorator.can_execute(ctx)? {
                        emit(trace, ctx, TAG_SKIP, decorator.name(), 0);
                        return Ok(Status::Failure);
                    }
                    decorator.on_start(ctx)?;
                    emit(trace, ctx, TAG_START, decorator.name(), 0);
                }
                let mut status = child.tick(ctx, trace)?;
                if status.is_terminal() {
                    decorator.on_finished_result(ctx, &mut status)?;
                    decorator.on_finished(ctx)?;
                    emit(trace, ctx, TAG_FINISH, decorator.name(), status_code(status));
                }
                Ok(status)
            }
            TreeNode::Sequence(c) => c.tick_sequence(ctx, trace),
            TreeNode::Selector(c) => c.tick_selector(ctx, trace),
        }
    }

    /// Cancel whatever is running below this node. Idle subtrees are left alone.
    pub fn abort(
        &mut self,
        ctx: &mut NodeContext<'_>,
        trace: &mut dyn TraceSink,
    ) -> Result<(), LifecycleError> {
        match self {
            TreeNode::Leaf(node) => {
                if node.is_started() {
                    node.on_abort(ctx)?;
                    emit(trace, ctx, TAG_ABORT, node.name(), 0);
                }
            }
            TreeNode::Decorated { decorator, child } => {
                if decorator.is_started() {
                    child.abort(ctx, trace)?;
                    decorator.on_abort(ctx)?;
                    emit(trace, ctx, TAG_ABORT, decorator.name(), 0);
                }
            }
            TreeNode::Sequence(c) | TreeNode::Selector(c) => c.abort(ctx, trace)?,
        }
        Ok(())
    }

    /// Conditions guarding this branch: the branch itself when it is a
    /// condition, or the conditions a sequence starts with.
    fn leading_conditions(&mut self) -> Vec<&mut Node> {
        match self {
            TreeNode::Leaf(node) if node.category() == NodeCategory::Condition => vec![node],
            TreeNode::Sequence(c) => c
                .children
                .iter_mut()
                .map_while(|child| match child {
                    TreeNode::Leaf(node) if node.category() == NodeCategory::Condition => {
                        Some(node)
                    }
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn run_leaf(
    node: &mut Node,
    ctx: &mut NodeContext<'_>,
    trace: &mut dyn TraceSink,
) -> Result<Status, LifecycleError> {
    if !node.is_started() {
        node.on_start(ctx)?;
        emit(trace, ctx, TAG_START, node.name(), 0);
    }
    let status = node.update(ctx)?;
    if status.is_terminal() {
        node.on_finished(ctx)?;
        emit(trace, ctx, TAG_FINISH, node.name(), status_code(status));
    }
    Ok(status)
}

/// Full start/update/finish cycle of a condition, used for re-evaluation.
fn evaluate(condition: &mut Node, ctx: &mut NodeContext<'_>) -> Result<Status, LifecycleError> {
    condition.on_start(ctx)?;
    let status = condition.update(ctx)?;
    condition.on_finished(ctx)?;
    Ok(status)
}

/// `a` payload of finish events: 0 running, 1 success, 2 failure.
pub fn status_code(status: Status) -> u64 {
    match status {
        Status::Running => 0,
        Status::Success => 1,
        Status::Failure => 2,
    }
}

fn emit(trace: &mut dyn TraceSink, ctx: &NodeContext<'_>, tag: &'static str, node: &str, a: u64) {
    trace.emit(
        TraceEvent::new(ctx.tick.tick, tag)
            .with_node(node.to_string())
            .with_a(a),
    );
}

/// A behavior tree bound to one agent.
///
/// Owns the root, drives the node lifecycle every tick and clears the
/// blackboard's values-changed flag afterwards. Implements [`Policy`] so a
/// [`bt_core::Brain`] can run it; the tree initializes itself on the first
/// tick for an owner.
pub struct Tree {
    name: String,
    root: TreeNode,
    trace: Box<dyn TraceSink>,
    owner: Option<OwnerId>,
    last_status: Option<Status>,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tree")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("last_status", &self.last_status)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Tree {
    pub fn new(name: impl Into<String>, root: TreeNode) -> Self {
        Self {
            name: name.into(),
            root,
            trace: Box::new(NullTraceSink),
            owner: None,
            last_status: None,
        }
    }

    pub fn with_trace_sink(mut self, sink: impl TraceSink + 'static) -> Self {
        self.trace = Box::new(sink);
        self
    }

    /// Instantiate every node of `spec` through `registry`.
    pub fn build(
        name: impl Into<String>,
        spec: &TreeSpec,
        registry: &NodeRegistry,
    ) -> Result<Self, BuildError> {
        let name = name.into();
        let root = build_node(spec, registry)?;
        tracing::debug!(tree = name.as_str(), nodes = root.node_count(), "tree built");
        Ok(Self::new(name, root))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut TreeNode {
        &mut self.root
    }

    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    pub fn last_status(&self) -> Option<Status> {
        self.last_status
    }

    pub fn find(&self, name: &str) -> Option<&Node> {
        self.root.find(name)
    }

    pub fn initialize(&mut self, owner: OwnerId, blackboard: &mut Blackboard) {
        self.root.initialize(owner, blackboard);
        self.owner = Some(owner);
        self.last_status = None;
        tracing::debug!(tree = self.name.as_str(), owner = owner.0, "tree initialized");
    }

    /// Tick the root once.
    pub fn update(&mut self, ctx: &mut NodeContext<'_>) -> Result<Status, LifecycleError> {
        let result = self.root.tick(ctx, self.trace.as_mut());
        ctx.blackboard.clear_values_changed();
        let status = result?;
        self.last_status = Some(status);
        Ok(status)
    }

    /// Abort whatever is running; the next tick starts a fresh run.
    pub fn abort(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), LifecycleError> {
        self.root.abort(ctx, self.trace.as_mut())
    }
}

impl Policy for Tree {
    fn tick(
        &mut self,
        ctx: &TickContext,
        owner: OwnerId,
        engine: &mut dyn Engine,
        blackboard: &mut Blackboard,
    ) {
        if self.owner != Some(owner) {
            self.initialize(owner, blackboard);
        }
        let mut node_ctx = NodeContext::new(*ctx, owner, blackboard, engine);
        if let Err(err) = self.update(&mut node_ctx) {
            tracing::warn!(tree = self.name.as_str(), %err, "tree tick failed");
        }
    }

    fn stop(
        &mut self,
        ctx: &TickContext,
        owner: OwnerId,
        engine: &mut dyn Engine,
        blackboard: &mut Blackboard,
    ) {
        if self.owner != Some(owner) {
            return;
        }
        let mut node_ctx = NodeContext::new(*ctx, owner, blackboard, engine);
        if let Err(err) = self.abort(&mut node_ctx) {
            tracing::warn!(tree = self.name.as_str(), %err, "tree stop failed");
        }
    }
}

fn build_node(spec: &TreeSpec, registry: &NodeRegistry) -> Result<TreeNode, BuildError> {
    match spec {
        TreeSpec::Node(node) => match node.category {
            NodeCategory::Action | NodeCategory::Condition => {
                Ok(TreeNode::Leaf(registry.instantiate(node)?))
            }
            found => Err(BuildError::WrongCategory {
                name: node.instance_name().to_string(),
                expected: "an action or condition",
                found,
            }),
        },
        TreeSpec::Decorated { decorator, child } => {
            if decorator.category != NodeCategory::Decorator {
                return Err(BuildError::WrongCategory {
                    name: decorator.instance_name().to_string(),
                    expected: "a decorator",
                    found: decorator.category,
                });
            }
            let decorator = registry.instantiate(decorator)?;
            Ok(TreeNode::decorated(decorator, build_node(child, registry)?))
        }
        TreeSpec::Sequence { name, children } => {
            let children = build_children("sequence", name, children, registry)?;
            Ok(TreeNode::sequence(name.as_str(), children))
        }
        TreeSpec::Selector { name, children } => {
            let children = build_children("selector", name, children, registry)?;
            Ok(TreeNode::selector(name.as_str(), children))
        }
    }
}

fn build_children(
    kind: &'static str,
    name: &str,
    children: &[TreeSpec],
    registry: &NodeRegistry,
) -> Result<Vec<TreeNode>, BuildError> {
    if children.is_empty() {
        return Err(BuildError::EmptyComposite {
            kind,
            name: name.to_string(),
        });
    }
    children
        .iter()
        .map(|child| build_node(child, registry))
        .collect()
}
