use std::any::type_name;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use bt_core::{Blackboard, BlackboardTemplate};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::node::{
    ActionNode, ConditionNode, DecoratorNode, Node, NodeCategory, NodeKind, PriorityType,
};
use crate::params::{ParamError, ParamMap};

pub type ActionFactory = Arc<dyn Fn() -> Box<dyn ActionNode> + Send + Sync>;
pub type ConditionFactory = Arc<dyn Fn() -> Box<dyn ConditionNode> + Send + Sync>;
pub type DecoratorFactory = Arc<dyn Fn() -> Box<dyn DecoratorNode> + Send + Sync>;
pub type BlackboardFactory = Arc<dyn Fn() -> Blackboard + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("no {category} registered as `{name}`")]
    UnknownNode { category: NodeCategory, name: String },

    #[error("a {0} registration cannot be instantiated as a tree node")]
    NotANode(NodeCategory),

    #[error(transparent)]
    Param(#[from] ParamError),
}

/// One published binding: display name and type identifier -> factory.
#[derive(Clone)]
pub struct Registration<F> {
    pub display_name: String,
    pub type_name: String,
    factory: F,
}

impl<F> Registration<F> {
    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl<F> fmt::Debug for Registration<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("display_name", &self.display_name)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Serialized reference to a registered node, as found in a tree asset.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeSpec {
    pub category: NodeCategory,
    /// Registered display name.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub type_name: String,
    /// Instance name; empty means "use the display name".
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: ParamMap,
    #[cfg_attr(feature = "serde", serde(default))]
    pub priority: PriorityType,
}

impl NodeSpec {
    pub fn new(category: NodeCategory, type_name: impl Into<String>) -> Self {
        Self {
            category,
            type_name: type_name.into(),
            name: String::new(),
            params: ParamMap::new(),
            priority: PriorityType::None,
        }
    }

    pub fn action(type_name: impl Into<String>) -> Self {
        Self::new(NodeCategory::Action, type_name)
    }

    pub fn condition(type_name: impl Into<String>) -> Self {
        Self::new(NodeCategory::Condition, type_name)
    }

    pub fn decorator(type_name: impl Into<String>) -> Self {
        Self::new(NodeCategory::Decorator, type_name)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_param(
        mut self,
        field: impl Into<String>,
        value: impl Into<bt_core::Value>,
    ) -> Self {
        self.params.insert(field.into(), value.into());
        self
    }

    pub fn with_priority(mut self, priority: PriorityType) -> Self {
        self.priority = priority;
        self
    }

    pub fn instance_name(&self) -> &str {
        if self.name.is_empty() {
            &self.type_name
        } else {
            &self.name
        }
    }
}

/// Name -> factory tables, one per [`NodeCategory`].
///
/// Registering a display name twice in the same category replaces the earlier
/// binding.
#[derive(Default)]
pub struct NodeRegistry {
    actions: BTreeMap<String, Registration<ActionFactory>>,
    conditions: BTreeMap<String, Registration<ConditionFactory>>,
    decorators: BTreeMap<String, Registration<DecoratorFactory>>,
    blackboards: BTreeMap<String, Registration<BlackboardFactory>>,
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("conditions", &self.conditions.keys().collect::<Vec<_>>())
            .field("decorators", &self.decorators.keys().collect::<Vec<_>>())
            .field("blackboards", &self.blackboards.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, populated at startup.
    pub fn global() -> &'static RwLock<NodeRegistry> {
        static GLOBAL: OnceLock<RwLock<NodeRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| RwLock::new(NodeRegistry::new()))
    }

    pub fn register_action<T: ActionNode + Default>(
        &mut self,
        display_name: Option<&str>,
    ) -> &mut Self {
        self.register_action_with(
            display_name_or_type::<T>(display_name),
            type_name::<T>(),
            || Box::new(T::default()) as Box<dyn ActionNode>,
        )
    }

    pub fn register_action_with(
        &mut self,
        display_name: impl Into<String>,
        type_name: impl Into<String>,
        factory: impl Fn() -> Box<dyn ActionNode> + Send + Sync + 'static,
    ) -> &mut Self {
        publish(
            &mut self.actions,
            NodeCategory::Action,
            display_name.into(),
            type_name.into(),
            Arc::new(factory),
        );
        self
    }

    pub fn register_condition<T: ConditionNode + Default>(
        &mut self,
        display_name: Option<&str>,
    ) -> &mut Self {
        self.register_condition_with(
            display_name_or_type::<T>(display_name),
            type_name::<T>(),
            || Box::new(T::default()) as Box<dyn ConditionNode>,
        )
    }

    pub fn register_condition_with(
        &mut self,
        display_name: impl Into<String>,
        type_name: impl Into<String>,
        factory: impl Fn() -> Box<dyn ConditionNode> + Send + Sync + 'static,
    ) -> &mut Self {
        publish(
            &mut self.conditions,
            NodeCategory::Condition,
            display_name.into(),
            type_name.into(),
            Arc::new(factory),
        );
        self
    }

    pub fn register_decorator<T: DecoratorNode + Default>(
        &mut self,
        display_name: Option<&str>,
    ) -> &mut Self {
        self.register_decorator_with(
            display_name_or_type::<T>(display_name),
            type_name::<T>(),
            || Box::new(T::default()) as Box<dyn DecoratorNode>,
        )
    }

    pub fn register_decorator_with(
        &mut self,
        display_name: impl Into<String>,
        type_name: impl Into<String>,
        factory: impl Fn() -> Box<dyn DecoratorNode> + Send + Sync + 'static,
    ) -> &mut Self {
        publish(
            &mut self.decorators,
            NodeCategory::Decorator,
            display_name.into(),
            type_name.into(),
            Arc::new(factory),
        );
        self
    }

    /// Publish a blackboard template; created blackboards are named after
    /// the display name.
    pub fn register_blackboard<T>(&mut self, display_name: Option<&str>) -> &mut Self
    where
        T: BlackboardTemplate + Default + 'static,
    {
        let display_name = display_name_or_type::<T>(display_name).to_string();
        let board_name = display_name.clone();
        self.register_blackboard_with(display_name, type_name::<T>(), move || {
            Blackboard::from_template(board_name.clone(), &T::default())
        })
    }

    pub fn register_blackboard_with(
        &mut self,
        display_name: impl Into<String>,
        type_name: impl Into<String>,
        factory: impl Fn() -> Blackboard + Send + Sync + 'static,
    ) -> &mut Self {
        publish(
            &mut self.blackboards,
            NodeCategory::Blackboard,
            display_name.into(),
            type_name.into(),
            Arc::new(factory),
        );
        self
    }

    pub fn action(&self, name: &str) -> Option<&Registration<ActionFactory>> {
        self.actions.get(name)
    }

    pub fn condition(&self, name: &str) -> Option<&Registration<ConditionFactory>> {
        self.conditions.get(name)
    }

    pub fn decorator(&self, name: &str) -> Option<&Registration<DecoratorFactory>> {
        self.decorators.get(name)
    }

    pub fn blackboard(&self, name: &str) -> Option<&Registration<BlackboardFactory>> {
        self.blackboards.get(name)
    }

    /// Type identifier bound to `name`, if registered.
    pub fn type_name(&self, category: NodeCategory, name: &str) -> Option<&str> {
        let type_name = match category {
            NodeCategory::Action => &self.actions.get(name)?.type_name,
            NodeCategory::Condition => &self.conditions.get(name)?.type_name,
            NodeCategory::Decorator => &self.decorators.get(name)?.type_name,
            NodeCategory::Blackboard => &self.blackboards.get(name)?.type_name,
        };
        Some(type_name)
    }

    pub fn contains(&self, category: NodeCategory, name: &str) -> bool {
        self.type_name(category, name).is_some()
    }

    /// Registered display names of a category, sorted.
    pub fn names(&self, category: NodeCategory) -> Vec<&str> {
        match category {
            NodeCategory::Action => self.actions.keys().map(String::as_str).collect(),
            NodeCategory::Condition => self.conditions.keys().map(String::as_str).collect(),
            NodeCategory::Decorator => self.decorators.keys().map(String::as_str).collect(),
            NodeCategory::Blackboard => self.blackboards.keys().map(String::as_str).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len() + self.conditions.len() + self.decorators.len() + self.blackboards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn create_action(&self, name: &str) -> Result<Box<dyn ActionNode>, RegistryError> {
        let registration = self
            .action(name)
            .ok_or_else(|| unknown(NodeCategory::Action, name))?;
        Ok((registration.factory)())
    }

    pub fn create_condition(&self, name: &str) -> Result<Box<dyn ConditionNode>, RegistryError> {
        let registration = self
            .condition(name)
            .ok_or_else(|| unknown(NodeCategory::Condition, name))?;
        Ok((registration.factory)())
    }

    pub fn create_decorator(&self, name: &str) -> Result<Box<dyn DecoratorNode>, RegistryError> {
        let registration = self
            .decorator(name)
            .ok_or_else(|| unknown(NodeCategory::Decorator, name))?;
        Ok((registration.factory)())
    }

    pub fn create_blackboard(&self, name: &str) -> Result<Blackboard, RegistryError> {
        let registration = self
            .blackboard(name)
            .ok_or_else(|| unknown(NodeCategory::Blackboard, name))?;
        Ok((registration.factory)())
    }

    /// Build the node a spec refers to and apply its stored parameters.
    pub fn instantiate(&self, spec: &NodeSpec) -> Result<Node, RegistryError> {
        let kind = match spec.category {
            NodeCategory::Action => NodeKind::Action(self.create_action(&spec.type_name)?),
            NodeCategory::Condition => NodeKind::Condition {
                node: self.create_condition(&spec.type_name)?,
                priority: spec.priority,
            },
            NodeCategory::Decorator => NodeKind::Decorator(self.create_decorator(&spec.type_name)?),
            NodeCategory::Blackboard => return Err(RegistryError::NotANode(spec.category)),
        };
        let mut node = Node::new(spec.instance_name(), kind);
        node.set_parameters(&spec.params)?;
        Ok(node)
    }
}

fn publish<F>(
    table: &mut BTreeMap<String, Registration<F>>,
    category: NodeCategory,
    display_name: String,
    type_name: String,
    factory: F,
) {
    let registration = Registration {
        display_name: display_name.clone(),
        type_name,
        factory,
    };
    let type_name = registration.type_name.clone();
    match table.insert(display_name.clone(), registration) {
        Some(previous) => tracing::warn!(
            %category,
            name = display_name.as_str(),
            previous = previous.type_name.as_str(),
            replacement = type_name.as_str(),
            "node registration replaced"
        ),
        None => tracing::debug!(
            %category,
            name = display_name.as_str(),
            type_name = type_name.as_str(),
            "node registered"
        ),
    }
}

fn unknown(category: NodeCategory, name: &str) -> RegistryError {
    RegistryError::UnknownNode {
        category,
        name: name.to_string(),
    }
}

/// `display_name` unless it is missing or blank, else `T`'s short type name.
fn display_name_or_type<T: ?Sized>(display_name: Option<&str>) -> &str {
    display_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(short_type_name::<T>())
}

/// Last path segment of `T`'s type name, generics stripped.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Patrol;

    #[test]
    fn short_type_name_drops_module_path() {
        assert_eq!(short_type_name::<Patrol>(), "Patrol");
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec");
    }

    #[test]
    fn blank_display_names_fall_back_to_type_name() {
        assert_eq!(display_name_or_type::<Patrol>(None), "Patrol");
        assert_eq!(display_name_or_type::<Patrol>(Some("")), "Patrol");
        assert_eq!(display_name_or_type::<Patrol>(Some("  \t")), "Patrol");
        assert_eq!(display_name_or_type::<Patrol>(Some("Guard")), "Guard");
    }
}
