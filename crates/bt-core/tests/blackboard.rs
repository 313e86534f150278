use std::cell::RefCell;
use std::rc::Rc;

use bt_core::{Blackboard, BlackboardTemplate, ChangeObserver, OwnerId, Value, ValueKind};

#[derive(Clone, Default)]
struct CountingObserver(Rc<RefCell<Vec<OwnerId>>>);

impl ChangeObserver for CountingObserver {
    fn blackboard_changed(&mut self, owner: OwnerId) {
        self.0.borrow_mut().push(owner);
    }
}

struct GuardBlackboard;

impl BlackboardTemplate for GuardBlackboard {
    fn populate(&self, bb: &mut Blackboard) {
        bb.create_int("Health", 100);
        bb.create_int("Counter", 0);
        bb.create_float("Speed", 5.0);
        bb.create_string("EnemyTag", "Enemy");
        bb.create_bool("IsAlerted", false);
        bb.create_bool("HasTarget", false);
    }
}

#[test]
fn absent_keys_read_as_zero_values() {
    let bb = Blackboard::new();
    for key in ["", "Health", "does-not-exist"] {
        assert!(!bb.get_bool(key));
        assert_eq!(bb.get_int(key), 0);
        assert_eq!(bb.get_float(key), 0.0);
        assert_eq!(bb.get_string(key), "");
        assert_eq!(bb.get_str(key), "");
        assert_eq!(bb.get_handle(key), 0);
    }
    assert!(bb.is_empty());
}

#[test]
fn set_then_get_returns_written_value() {
    let mut bb = Blackboard::new();
    bb.set_int("Health", -7);
    bb.set_bool("Alert", true);
    bb.set_float("Speed", 2.5);
    bb.set_string("Tag", "Enemy");
    bb.set_handle("Target", u64::MAX);

    assert_eq!(bb.get_int("Health"), -7);
    assert!(bb.get_bool("Alert"));
    assert_eq!(bb.get_float("Speed"), 2.5);
    assert_eq!(bb.get_string("Tag"), "Enemy");
    assert_eq!(bb.get_handle("Target"), u64::MAX);
}

#[test]
fn kinds_have_independent_namespaces() {
    let mut bb = Blackboard::new();
    bb.create_int("Key", 3);
    bb.create_bool("Key", true);

    assert_eq!(bb.get_int("Key"), 3);
    assert!(bb.get_bool("Key"));
    assert!(!bb.has_float("Key"));
    assert_eq!(bb.get_float("Key"), 0.0);

    bb.set_int("Key", 4);
    assert!(bb.get_bool("Key"));
    assert_eq!(bb.len(), 2);
}

#[test]
fn has_distinguishes_absent_from_zero() {
    let mut bb = Blackboard::new();
    assert!(!bb.has_int("Counter"));
    bb.create_int("Counter", 0);
    assert!(bb.has_int("Counter"));
    assert_eq!(bb.get_int("Counter"), 0);
}

#[test]
fn each_set_notifies_exactly_once_and_create_is_silent() {
    let observer = CountingObserver::default();
    let seen = observer.0.clone();

    let mut bb = Blackboard::new();
    bb.bind_owner(OwnerId(42));
    bb.add_observer(Box::new(observer));

    bb.create_int("Counter", 0);
    assert!(seen.borrow().is_empty());
    assert!(!bb.is_values_changed());

    bb.set_int("Counter", 1);
    bb.set_bool("Alert", true);
    bb.set_string("Tag", "x");

    assert_eq!(*seen.borrow(), vec![OwnerId(42); 3]);
    assert!(bb.is_values_changed());

    bb.clear_values_changed();
    assert!(!bb.is_values_changed());
}

#[test]
fn set_creates_missing_keys_implicitly() {
    let mut bb = Blackboard::new();
    bb.set_float("Fresh", 1.5);
    assert!(bb.has_float("Fresh"));
    assert_eq!(bb.get_float("Fresh"), 1.5);
}

#[test]
fn create_overwrites_silently() {
    let mut bb = Blackboard::new();
    bb.create_int("Health", 100);
    bb.create_int("Health", 50);
    assert_eq!(bb.get_int("Health"), 50);
    assert!(!bb.is_values_changed());
}

#[test]
fn template_populates_keys() {
    let bb = Blackboard::from_template("Guard", &GuardBlackboard);
    assert_eq!(bb.name(), "Guard");
    assert_eq!(bb.get_int("Health"), 100);
    assert_eq!(bb.get_float("Speed"), 5.0);
    assert_eq!(bb.get_str("EnemyTag"), "Enemy");
    assert!(bb.has_bool("HasTarget"));

    let ints: Vec<_> = bb.entries::<i32>().collect();
    assert_eq!(ints, vec![("Counter", 0), ("Health", 100)]);

    let bools: Vec<_> = bb.keys::<bool>().collect();
    assert_eq!(bools, vec!["HasTarget", "IsAlerted"]);
}

#[test]
fn iter_groups_by_kind_then_key() {
    let mut bb = Blackboard::new();
    bb.create_bool("b", true);
    bb.create_float("f", 1.0);
    bb.create_int("a", 1);

    let all: Vec<_> = bb.iter().map(|(kind, key, value)| (kind, key, value.clone())).collect();
    assert_eq!(
        all,
        vec![
            (ValueKind::Float, "f", Value::Float(1.0)),
            (ValueKind::Int, "a", Value::Int(1)),
            (ValueKind::Bool, "b", Value::Bool(true)),
        ]
    );
}
