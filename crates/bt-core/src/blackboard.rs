use std::collections::BTreeMap;
use std::fmt;

use crate::{BlackboardValue, OwnerId, Value, ValueKind};

/// Receives "this agent's blackboard changed" notifications.
///
/// Called synchronously, once per `set*` write, with no payload beyond the owner.
pub trait ChangeObserver {
    fn blackboard_changed(&mut self, owner: OwnerId);
}

/// Declares the keys (and initial values) of a blackboard.
///
/// Registered under the registry's Blackboard category and applied once at
/// setup with the silent `create*` calls.
pub trait BlackboardTemplate {
    fn populate(&self, blackboard: &mut Blackboard);
}

/// Per-agent typed key/value memory shared by every node of that agent's tree.
///
/// Values are partitioned by [`ValueKind`]: `"Health"` as an int and
/// `"Health"` as a bool are two unrelated entries. Reads of absent keys return
/// the kind's zero value; absence is never an error.
///
/// `create*` establishes a key silently (setup time). `set*` writes (creating
/// the key if needed), raises the values-changed flag and notifies every
/// attached [`ChangeObserver`] exactly once.
#[derive(Default)]
pub struct Blackboard {
    name: String,
    owner: OwnerId,
    partitions: BTreeMap<ValueKind, BTreeMap<String, Value>>,
    values_changed: bool,
    observers: Vec<Box<dyn ChangeObserver>>,
}

impl fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blackboard")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("partitions", &self.partitions)
            .field("values_changed", &self.values_changed)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build a blackboard and let `template` declare its keys.
    pub fn from_template(name: impl Into<String>, template: &dyn BlackboardTemplate) -> Self {
        let mut blackboard = Self::named(name);
        template.populate(&mut blackboard);
        blackboard
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Scope this blackboard to `owner`; notifications carry this id.
    pub fn bind_owner(&mut self, owner: OwnerId) {
        self.owner = owner;
    }

    pub fn add_observer(&mut self, observer: Box<dyn ChangeObserver>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Establish `key` in `T`'s partition. Overwrites silently, no notification.
    pub fn create<T: BlackboardValue>(&mut self, key: impl Into<String>, value: T) {
        let key = key.into();
        tracing::trace!(
            owner = self.owner.0,
            kind = T::KIND.name(),
            key = key.as_str(),
            "blackboard create"
        );
        self.partitions
            .entry(T::KIND)
            .or_default()
            .insert(key, value.into());
    }

    /// Read `key` from `T`'s partition, or `T::default()` when absent.
    pub fn get<T: BlackboardValue>(&self, key: &str) -> T {
        self.raw(T::KIND, key)
            .and_then(T::from_value)
            .unwrap_or_default()
    }

    /// Write `key` in `T`'s partition and notify observers.
    ///
    /// Keys that were never created are created implicitly.
    pub fn set<T: BlackboardValue>(&mut self, key: impl Into<String>, value: T) {
        let key = key.into();
        tracing::trace!(
            owner = self.owner.0,
            kind = T::KIND.name(),
            key = key.as_str(),
            "blackboard set"
        );
        self.partitions
            .entry(T::KIND)
            .or_default()
            .insert(key, value.into());
        self.values_changed = true;
        self.notify();
    }

    pub fn has<T: BlackboardValue>(&self, key: &str) -> bool {
        self.raw(T::KIND, key).is_some()
    }

    /// Raw access to a stored value.
    pub fn raw(&self, kind: ValueKind, key: &str) -> Option<&Value> {
        self.partitions.get(&kind)?.get(key)
    }

    /// Keys of `T`'s partition in key order.
    pub fn keys<T: BlackboardValue>(&self) -> impl Iterator<Item = &str> + '_ {
        self.partitions
            .get(&T::KIND)
            .into_iter()
            .flat_map(|partition| partition.keys().map(String::as_str))
    }

    /// `(key, value)` pairs of `T`'s partition in key order.
    pub fn entries<T: BlackboardValue>(&self) -> impl Iterator<Item = (&str, T)> + '_ {
        self.partitions
            .get(&T::KIND)
            .into_iter()
            .flat_map(|partition| {
                partition
                    .iter()
                    .filter_map(|(k, v)| T::from_value(v).map(|v| (k.as_str(), v)))
            })
    }

    /// Every stored value, grouped by kind then key.
    pub fn iter(&self) -> impl Iterator<Item = (ValueKind, &str, &Value)> + '_ {
        self.partitions.iter().flat_map(|(kind, partition)| {
            partition.iter().map(move |(k, v)| (*kind, k.as_str(), v))
        })
    }

    pub fn len(&self) -> usize {
        self.partitions.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any `set*` happened since the last [`Self::clear_values_changed`].
    pub fn is_values_changed(&self) -> bool {
        self.values_changed
    }

    pub fn clear_values_changed(&mut self) {
        self.values_changed = false;
    }

    /// Fire one change notification to every observer.
    pub fn notify(&mut self) {
        let owner = self.owner;
        for observer in self.observers.iter_mut() {
            observer.blackboard_changed(owner);
        }
    }

    pub fn create_bool(&mut self, key: impl Into<String>, value: bool) {
        self.create(key, value);
    }

    pub fn create_int(&mut self, key: impl Into<String>, value: i32) {
        self.create(key, value);
    }

    pub fn create_float(&mut self, key: impl Into<String>, value: f32) {
        self.create(key, value);
    }

    pub fn create_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.create(key, value.into());
    }

    pub fn create_handle(&mut self, key: impl Into<String>, value: u64) {
        self.create(key, value);
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
    }

    pub fn get_int(&self, key: &str) -> i32 {
        self.get(key)
    }

    pub fn get_float(&self, key: &str) -> f32 {
        self.get(key)
    }

    pub fn get_string(&self, key: &str) -> String {
        self.get(key)
    }

    /// Borrowing variant of [`Self::get_string`].
    pub fn get_str(&self, key: &str) -> &str {
        self.raw(ValueKind::String, key)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn get_handle(&self, key: &str) -> u64 {
        self.get(key)
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.set(key, value);
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i32) {
        self.set(key, value);
    }

    pub fn set_float(&mut self, key: impl Into<String>, value: f32) {
        self.set(key, value);
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set(key, value.into());
    }

    pub fn set_handle(&mut self, key: impl Into<String>, value: u64) {
        self.set(key, value);
    }

    pub fn has_bool(&self, key: &str) -> bool {
        self.has::<bool>(key)
    }

    pub fn has_int(&self, key: &str) -> bool {
        self.has::<i32>(key)
    }

    pub fn has_float(&self, key: &str) -> bool {
        self.has::<f32>(key)
    }

    pub fn has_string(&self, key: &str) -> bool {
        self.has::<String>(key)
    }

    pub fn has_handle(&self, key: &str) -> bool {
        self.has::<u64>(key)
    }
}
