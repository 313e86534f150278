use std::cell::RefCell;
use std::rc::Rc;

use bt_core::{Blackboard, Brain, NodeContext, NullEngine, OwnerId, TickContext};
use bt_nodes::{
    register_builtins, ActionNode, BlackboardBoolCondition, BuildError, LifecycleError, NoParams,
    Node, NodeCategory, NodeRegistry, NodeSpec, ParameterSet, PriorityType, RegistryError, Status,
    Tree, TreeNode, TreeSpec,
};
use bt_tools::SharedTraceSink;

type Log = Rc<RefCell<Vec<String>>>;

/// Runs for `running_ticks` ticks, then succeeds.
struct Step {
    name: &'static str,
    log: Log,
    running_ticks: u32,
    left: u32,
    params: NoParams,
}

impl Step {
    fn node(name: &'static str, log: &Log, running_ticks: u32) -> Node {
        Node::action(
            name,
            Step {
                name,
                log: log.clone(),
                running_ticks,
                left: 0,
                params: NoParams,
            },
        )
    }

    fn record(&self, event: &str) {
        self.log.borrow_mut().push(format!("{}:{event}", self.name));
    }
}

impl ActionNode for Step {
    fn parameters(&self) -> &dyn ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut dyn ParameterSet {
        &mut self.params
    }

    fn on_start(&mut self, _ctx: &mut NodeContext<'_>) {
        self.left = self.running_ticks;
        self.record("start");
    }

    fn update(&mut self, _ctx: &mut NodeContext<'_>) -> Status {
        self.record("update");
        if self.left == 0 {
            Status::Success
        } else {
            self.left -= 1;
            Status::Running
        }
    }

    fn on_finished(&mut self, _ctx: &mut NodeContext<'_>) {
        self.record("finish");
    }

    fn on_abort(&mut self, _ctx: &mut NodeContext<'_>) {
        self.record("abort");
    }
}

fn has_target(priority: PriorityType) -> Node {
    Node::condition("has target", BlackboardBoolCondition::new("HasTarget", true))
        .with_priority(priority)
}

struct Harness {
    tree: Tree,
    bb: Blackboard,
    engine: NullEngine,
    tick: u64,
}

impl Harness {
    fn new(root: TreeNode) -> Self {
        let mut bb = Blackboard::new();
        let mut tree = Tree::new("test", root);
        tree.initialize(OwnerId(1), &mut bb);
        Self {
            tree,
            bb,
            engine: NullEngine::default(),
            tick: 0,
        }
    }

    fn with_trace(mut self, sink: &SharedTraceSink) -> Self {
        self.tree = self.tree.with_trace_sink(sink.clone());
        self
    }

    fn step(&mut self) -> Status {
        let mut ctx = NodeContext::new(
            TickContext::new(self.tick),
            OwnerId(1),
            &mut self.bb,
            &mut self.engine,
        );
        self.tick += 1;
        self.tree.update(&mut ctx).expect("tick")
    }

    fn stop(&mut self) {
        let mut ctx = NodeContext::new(
            TickContext::new(self.tick),
            OwnerId(1),
            &mut self.bb,
            &mut self.engine,
        );
        self.tree.abort(&mut ctx).expect("abort");
    }
}

fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

#[test]
fn sequence_drives_each_child_through_its_lifecycle() {
    let log = Log::default();
    let root = TreeNode::sequence(
        "seq",
        vec![Step::node("a", &log, 0), Step::node("b", &log, 1)]
            .into_iter()
            .map(TreeNode::leaf)
            .collect(),
    );
    let mut h = Harness::new(root);

    assert_eq!(h.step(), Status::Running);
    assert_eq!(
        take(&log),
        vec!["a:start", "a:update", "a:finish", "b:start", "b:update"]
    );

    assert_eq!(h.step(), Status::Success);
    assert_eq!(take(&log), vec!["b:update", "b:finish"]);

    // A finished run starts over from the first child.
    assert_eq!(h.step(), Status::Running);
    assert_eq!(take(&log)[0], "a:start");
}

#[test]
fn selector_falls_through_failing_branches() {
    let log = Log::default();
    let root = TreeNode::selector(
        "root",
        vec![
            TreeNode::leaf(has_target(PriorityType::None)),
            TreeNode::leaf(Step::node("patrol", &log, 0)),
        ],
    );
    let mut h = Harness::new(root);

    assert_eq!(h.step(), Status::Success);
    assert_eq!(take(&log), vec!["patrol:start", "patrol:update", "patrol:finish"]);

    h.bb.set_bool("HasTarget", true);
    assert_eq!(h.step(), Status::Success);
    assert!(take(&log).is_empty());
}

fn attack_or_patrol(log: &Log, priority: PriorityType) -> TreeNode {
    TreeNode::selector(
        "root",
        vec![
            TreeNode::sequence(
                "attack",
                vec![
                    TreeNode::leaf(has_target(priority)),
                    TreeNode::leaf(Step::node("attack", log, 10)),
                ],
            ),
            TreeNode::leaf(Step::node("patrol", log, 10)),
        ],
    )
}

#[test]
fn lower_priority_condition_interrupts_running_branch() {
    let log = Log::default();
    let sink = SharedTraceSink::new();
    let mut h = Harness::new(attack_or_patrol(&log, PriorityType::LowerPriority)).with_trace(&sink);

    assert_eq!(h.step(), Status::Running);
    assert_eq!(take(&log), vec!["patrol:start", "patrol:update"]);

    h.bb.set_bool("HasTarget", true);
    sink.clear();
    assert_eq!(h.step(), Status::Running);
    assert_eq!(
        take(&log),
        vec!["patrol:abort", "attack:start", "attack:update"]
    );

    let events = sink.events();
    assert_eq!(events[0].tag, "bt.condition.interrupt");
    assert_eq!(events[0].node, "attack");
    assert_eq!(events[1].tag, "bt.node.abort");
    assert_eq!(events[1].node, "patrol");
    assert!(!h.bb.is_values_changed());
}

#[test]
fn conditions_without_priority_never_interrupt() {
    let log = Log::default();
    let mut h = Harness::new(attack_or_patrol(&log, PriorityType::None));

    h.step();
    take(&log);
    h.bb.set_bool("HasTarget", true);
    assert_eq!(h.step(), Status::Running);
    assert_eq!(take(&log), vec!["patrol:update"]);
}

#[test]
fn reevaluation_waits_for_a_blackboard_change() {
    let log = Log::default();
    let mut h = Harness::new(attack_or_patrol(&log, PriorityType::Both));

    h.step();
    take(&log);

    h.bb.set_bool("HasTarget", true);
    h.bb.clear_values_changed();
    h.step();
    assert_eq!(take(&log), vec!["patrol:update"]);

    h.bb.set_int("Noise", 1);
    h.step();
    assert_eq!(
        take(&log),
        vec!["patrol:abort", "attack:start", "attack:update"]
    );
}

#[test]
fn self_priority_condition_aborts_its_sequence() {
    let log = Log::default();
    let root = TreeNode::sequence(
        "chase",
        vec![
            TreeNode::leaf(has_target(PriorityType::SelfOnly)),
            TreeNode::leaf(Step::node("chase", &log, 10)),
        ],
    );
    let mut h = Harness::new(root);
    h.bb.set_bool("HasTarget", true);

    assert_eq!(h.step(), Status::Running);
    assert_eq!(h.step(), Status::Running);
    assert_eq!(take(&log), vec!["chase:start", "chase:update", "chase:update"]);

    h.bb.set_bool("HasTarget", false);
    assert_eq!(h.step(), Status::Failure);
    assert_eq!(take(&log), vec!["chase:abort"]);
    assert_eq!(h.tree.last_status(), Some(Status::Failure));
}

#[test]
fn stopping_aborts_running_nodes_and_allows_restart() {
    let log = Log::default();
    let sink = SharedTraceSink::new();
    let mut h = Harness::new(attack_or_patrol(&log, PriorityType::None)).with_trace(&sink);

    h.step();
    take(&log);
    h.stop();
    assert_eq!(take(&log), vec!["patrol:abort"]);
    assert!(!h.tree.root().is_running());

    // Stopping an idle tree touches nothing.
    h.stop();
    assert!(take(&log).is_empty());

    h.step();
    assert_eq!(take(&log), vec!["patrol:start", "patrol:update"]);
}

#[test]
fn ticking_an_uninitialized_tree_fails() {
    let log = Log::default();
    let mut tree = Tree::new("raw", TreeNode::leaf(Step::node("a", &log, 0)));
    let mut bb = Blackboard::new();
    let mut engine = NullEngine::default();
    let mut ctx = NodeContext::new(TickContext::new(0), OwnerId(1), &mut bb, &mut engine);

    assert_eq!(
        tree.update(&mut ctx),
        Err(LifecycleError::NotInitialized {
            node: "a".to_string()
        })
    );
    assert!(log.borrow().is_empty());
}

#[test]
fn brain_runs_tree_as_its_policy() {
    let log = Log::default();
    let tree = Tree::new("patrol", TreeNode::leaf(Step::node("patrol", &log, 1)));
    let mut brain = Brain::new(OwnerId(3), Blackboard::new(), Box::new(tree));
    let mut engine = NullEngine::default();

    brain.tick(&TickContext::new(0), &mut engine);
    brain.tick(&TickContext::new(1), &mut engine);
    brain.tick(&TickContext::new(2), &mut engine);
    brain.stop(&TickContext::new(3), &mut engine);

    assert_eq!(
        take(&log),
        vec![
            "patrol:start",
            "patrol:update",
            "patrol:update",
            "patrol:finish",
            "patrol:start",
            "patrol:update",
            "patrol:abort",
        ]
    );
}

fn guard_spec() -> TreeSpec {
    TreeSpec::Selector {
        name: "root".to_string(),
        children: vec![
            TreeSpec::Sequence {
                name: "alert".to_string(),
                children: vec![
                    TreeSpec::Node(
                        NodeSpec::condition("BlackboardBool")
                            .named("Sees enemy")
                            .with_priority(PriorityType::LowerPriority),
                    ),
                    TreeSpec::Node(NodeSpec::action("SetBool").with_param("key", "IsAlerted")),
                ],
            },
            TreeSpec::Decorated {
                decorator: NodeSpec::decorator("CounterLimit").with_param("threshold", 2),
                child: Box::new(TreeSpec::Node(
                    NodeSpec::action("Wait").with_param("seconds", 0.0f32),
                )),
            },
        ],
    }
}

#[test]
fn trees_build_from_specs_through_the_registry() {
    let mut registry = NodeRegistry::new();
    register_builtins(&mut registry);
    let tree = Tree::build("guard", &guard_spec(), &registry).expect("build");

    assert_eq!(tree.root().node_count(), 4);
    let sees_enemy = tree.find("Sees enemy").expect("condition");
    assert_eq!(sees_enemy.priority(), PriorityType::LowerPriority);
    assert!(tree.find("CounterLimit").is_some());

    let mut brain = Brain::new(
        OwnerId(5),
        registry.create_blackboard("AgentBlackboard").expect("blackboard"),
        Box::new(tree),
    );
    let mut engine = NullEngine::default();
    for tick in 0..3 {
        brain.tick(&TickContext::new(tick), &mut engine);
    }
    assert_eq!(brain.blackboard.get_int("Counter"), 2);
    assert!(!brain.blackboard.get_bool("IsAlerted"));

    brain.blackboard.set_bool("HasTarget", true);
    brain.tick(&TickContext::new(3), &mut engine);
    assert!(brain.blackboard.get_bool("IsAlerted"));
}

#[test]
fn malformed_specs_are_rejected() {
    let mut registry = NodeRegistry::new();
    register_builtins(&mut registry);

    let decorator_leaf = TreeSpec::Node(NodeSpec::decorator("CounterLimit"));
    assert_eq!(
        Tree::build("bad", &decorator_leaf, &registry).err(),
        Some(BuildError::WrongCategory {
            name: "CounterLimit".to_string(),
            expected: "an action or condition",
            found: NodeCategory::Decorator,
        })
    );

    let empty = TreeSpec::Sequence {
        name: "nothing".to_string(),
        children: Vec::new(),
    };
    assert_eq!(
        Tree::build("bad", &empty, &registry).err(),
        Some(BuildError::EmptyComposite {
            kind: "sequence",
            name: "nothing".to_string(),
        })
    );

    let unknown = TreeSpec::Node(NodeSpec::action("Dance"));
    assert_eq!(
        Tree::build("bad", &unknown, &registry).err(),
        Some(BuildError::Registry(RegistryError::UnknownNode {
            category: NodeCategory::Action,
            name: "Dance".to_string(),
        }))
    );
}
