use std::cell::RefCell;
use std::rc::Rc;

use bt_core::{
    tick_brains, Blackboard, Brain, BrainConfig, Engine, EntityId, NodeContext, NullEngine,
    OwnerId, Policy, TickContext,
};

struct CountTicks(Rc<RefCell<Vec<(u64, OwnerId)>>>);

impl Policy for CountTicks {
    fn tick(
        &mut self,
        ctx: &TickContext,
        owner: OwnerId,
        _engine: &mut dyn Engine,
        blackboard: &mut Blackboard,
    ) {
        self.0.borrow_mut().push((ctx.tick, owner));
        let n = blackboard.get_int("ticks");
        blackboard.set_int("ticks", n + 1);
    }
}

#[derive(Default)]
struct OneEntityEngine {
    alive: Option<EntityId>,
}

impl Engine for OneEntityEngine {
    fn delta_time(&self) -> f32 {
        0.25
    }

    fn is_alive(&self, entity: EntityId) -> bool {
        self.alive == Some(entity)
    }
}

#[test]
fn brain_binds_owner_to_blackboard() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let brain = Brain::new(OwnerId(9), Blackboard::new(), Box::new(CountTicks(log)));
    assert_eq!(brain.blackboard.owner(), OwnerId(9));
}

#[test]
fn decimated_brain_only_thinks_on_its_ticks() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut brain = Brain::new(OwnerId(1), Blackboard::new(), Box::new(CountTicks(log.clone())))
        .with_config(BrainConfig {
            think_every_ticks: 3,
            think_offset_ticks: 0,
        });
    let mut engine = NullEngine::default();

    for tick in 0..7u64 {
        brain.tick(&TickContext::new(tick), &mut engine);
    }

    let ticks: Vec<u64> = log.borrow().iter().map(|(t, _)| *t).collect();
    assert_eq!(ticks, vec![0, 3, 6]);
    assert_eq!(brain.blackboard.get_int("ticks"), 3);
}

#[test]
fn deterministic_config_spreads_by_owner() {
    let a = BrainConfig::deterministic(OwnerId(4), 3);
    assert_eq!(a.think_every_ticks, 3);
    assert_eq!(a.think_offset_ticks, 1);
    assert!(a.should_think(2));
    assert!(!a.should_think(3));

    let zero = BrainConfig::deterministic(OwnerId(4), 0);
    assert_eq!(zero.think_every_ticks, 1);
    assert!(zero.should_think(17));
}

#[test]
fn think_schedule_survives_tick_wraparound() {
    let config = BrainConfig::deterministic(OwnerId(1), 4);
    assert_eq!(config.think_offset_ticks, 1);
    // u64::MAX + 1 wraps to 0, which is on the schedule.
    assert!(config.should_think(u64::MAX));
    assert!(!config.should_think(u64::MAX - 1));

    let mut tick = TickContext::new(u64::MAX);
    tick = tick.next();
    assert_eq!(tick.tick, 0);
    assert!(!config.should_think(tick.tick));
}

#[test]
fn tick_brains_runs_in_owner_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut brains = vec![
        Brain::new(OwnerId(3), Blackboard::new(), Box::new(CountTicks(log.clone()))),
        Brain::new(OwnerId(1), Blackboard::new(), Box::new(CountTicks(log.clone()))),
        Brain::new(OwnerId(2), Blackboard::new(), Box::new(CountTicks(log.clone()))),
    ];
    let mut engine = NullEngine::default();

    tick_brains(&TickContext::new(0), &mut engine, &mut brains);

    let owners: Vec<OwnerId> = log.borrow().iter().map(|(_, o)| *o).collect();
    assert_eq!(owners, vec![OwnerId(1), OwnerId(2), OwnerId(3)]);
}

#[test]
fn owner_is_resolved_through_engine_every_time() {
    let mut engine = OneEntityEngine {
        alive: Some(EntityId(5)),
    };
    let mut bb = Blackboard::new();

    {
        let ctx = NodeContext::new(TickContext::new(0), OwnerId(5), &mut bb, &mut engine);
        assert_eq!(ctx.owner(), Some(EntityId(5)));
        assert_eq!(ctx.delta_time(), 0.25);
    }

    engine.alive = None;
    let ctx = NodeContext::new(TickContext::new(1), OwnerId(5), &mut bb, &mut engine);
    assert_eq!(ctx.owner(), None);

    let mut other = OneEntityEngine::default();
    let ctx = NodeContext::new(TickContext::new(1), OwnerId::NONE, &mut bb, &mut other);
    assert_eq!(ctx.owner(), None);
}
