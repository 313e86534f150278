//! Ready-made nodes and the default agent blackboard.

use bt_core::{Blackboard, BlackboardTemplate, EntityId, NodeContext, Value, ValueKind, Vec3};

use crate::node::{ActionNode, ConditionNode, DecoratorNode, Status};
use crate::params::{FieldDescriptor, ParamError, ParameterSet};
use crate::registry::NodeRegistry;

/// Publish every built-in node and the default blackboard.
pub fn register_builtins(registry: &mut NodeRegistry) -> &mut NodeRegistry {
    registry
        .register_action::<WaitAction>(Some("Wait"))
        .register_action::<SetBoolAction>(Some("SetBool"))
        .register_action::<MoveToEntityAction>(Some("MoveToEntity"))
        .register_condition::<BlackboardBoolCondition>(Some("BlackboardBool"))
        .register_decorator::<CounterLimitDecorator>(Some("CounterLimit"))
        .register_blackboard::<AgentBlackboard>(Some("AgentBlackboard"))
}

/// Keys every agent starts with.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentBlackboard;

impl BlackboardTemplate for AgentBlackboard {
    fn populate(&self, blackboard: &mut Blackboard) {
        blackboard.create_int("Health", 100);
        blackboard.create_int("Counter", 0);
        blackboard.create_float("Speed", 5.0);
        blackboard.create_string("EnemyTag", "Enemy");
        blackboard.create_bool("IsAlerted", false);
        blackboard.create_bool("HasTarget", false);
        blackboard.create_handle("Target", 0);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaitParams {
    pub seconds: f32,
}

impl WaitParams {
    const FIELDS: &'static [FieldDescriptor] =
        &[FieldDescriptor::parameter("seconds", ValueKind::Float).display("Seconds")];
}

impl Default for WaitParams {
    fn default() -> Self {
        Self { seconds: 1.0 }
    }
}

impl ParameterSet for WaitParams {
    fn fields(&self) -> &'static [FieldDescriptor] {
        Self::FIELDS
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "seconds" => Some(self.seconds.into()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ParamError> {
        match (field, value) {
            ("seconds", Value::Float(v)) => self.seconds = v,
            (field, value) => return Err(ParamError::rejected(Self::FIELDS, field, &value)),
        }
        Ok(())
    }
}

/// Runs until `seconds` of engine time have passed.
#[derive(Debug, Default)]
pub struct WaitAction {
    pub params: WaitParams,
    elapsed: f32,
}

impl WaitAction {
    pub fn new(seconds: f32) -> Self {
        Self {
            params: WaitParams { seconds },
            elapsed: 0.0,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl ActionNode for WaitAction {
    fn parameters(&self) -> &dyn ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut dyn ParameterSet {
        &mut self.params
    }

    fn on_start(&mut self, _ctx: &mut NodeContext<'_>) {
        self.elapsed = 0.0;
    }

    fn update(&mut self, ctx: &mut NodeContext<'_>) -> Status {
        self.elapsed += ctx.delta_time();
        if self.elapsed >= self.params.seconds {
            Status::Success
        } else {
            Status::Running
        }
    }

    fn on_abort(&mut self, _ctx: &mut NodeContext<'_>) {
        self.elapsed = 0.0;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetBoolParams {
    pub key: String,
    pub value: bool,
}

impl SetBoolParams {
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::blackboard_key("key", ValueKind::Bool).display("Key"),
        FieldDescriptor::parameter("value", ValueKind::Bool).display("Value"),
    ];
}

impl Default for SetBoolParams {
    fn default() -> Self {
        Self {
            key: "IsAlerted".to_string(),
            value: true,
        }
    }
}

impl ParameterSet for SetBoolParams {
    fn fields(&self) -> &'static [FieldDescriptor] {
        Self::FIELDS
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "key" => Some(self.key.as_str().into()),
            "value" => Some(self.value.into()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ParamError> {
        match (field, value) {
            ("key", Value::String(v)) => self.key = v,
            ("value", Value::Bool(v)) => self.value = v,
            (field, value) => return Err(ParamError::rejected(Self::FIELDS, field, &value)),
        }
        Ok(())
    }
}

/// Writes a bool to the blackboard and succeeds.
#[derive(Debug, Default)]
pub struct SetBoolAction {
    pub params: SetBoolParams,
}

impl ActionNode for SetBoolAction {
    fn parameters(&self) -> &dyn ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut dyn ParameterSet {
        &mut self.params
    }

    fn update(&mut self, ctx: &mut NodeContext<'_>) -> Status {
        ctx.blackboard
            .set_bool(self.params.key.as_str(), self.params.value);
        Status::Success
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveToParams {
    pub target_key: String,
    pub speed: f32,
    pub acceptance_radius: f32,
}

impl MoveToParams {
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::blackboard_key("target_key", ValueKind::Handle).display("Target"),
        FieldDescriptor::parameter("speed", ValueKind::Float).display("Speed"),
        FieldDescriptor::parameter("acceptance_radius", ValueKind::Float),
    ];
}

impl Default for MoveToParams {
    fn default() -> Self {
        Self {
            target_key: "Target".to_string(),
            speed: 5.0,
            acceptance_radius: 0.5,
        }
    }
}

impl ParameterSet for MoveToParams {
    fn fields(&self) -> &'static [FieldDescriptor] {
        Self::FIELDS
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "target_key" => Some(self.target_key.as_str().into()),
            "speed" => Some(self.speed.into()),
            "acceptance_radius" => Some(self.acceptance_radius.into()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ParamError> {
        match (field, value) {
            ("target_key", Value::String(v)) => self.target_key = v,
            ("speed", Value::Float(v)) => self.speed = v,
            ("acceptance_radius", Value::Float(v)) => self.acceptance_radius = v,
            (field, value) => return Err(ParamError::rejected(Self::FIELDS, field, &value)),
        }
        Ok(())
    }
}

/// Moves the owner toward the entity stored under `target_key`.
///
/// Fails when the owner or target is gone, or when the engine refuses the
/// move. Both are resolved through the engine on every update.
#[derive(Debug, Default)]
pub struct MoveToEntityAction {
    pub params: MoveToParams,
}

impl ActionNode for MoveToEntityAction {
    fn parameters(&self) -> &dyn ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut dyn ParameterSet {
        &mut self.params
    }

    fn update(&mut self, ctx: &mut NodeContext<'_>) -> Status {
        let Some(owner) = ctx.owner() else {
            return Status::Failure;
        };
        let handle = ctx.blackboard.get_handle(&self.params.target_key);
        let Some(target) = EntityId::from_handle(handle).filter(|e| ctx.engine.is_alive(*e))
        else {
            return Status::Failure;
        };
        let (Some(from), Some(to)) = (ctx.engine.translation(owner), ctx.engine.translation(target))
        else {
            return Status::Failure;
        };

        let delta = sub(to, from);
        let distance = length(delta);
        let radius = self.params.acceptance_radius.max(0.0);
        if distance <= radius {
            return Status::Success;
        }

        let step = (self.params.speed.max(0.0) * ctx.delta_time()).min(distance);
        let next = [
            from[0] + delta[0] / distance * step,
            from[1] + delta[1] / distance * step,
            from[2] + delta[2] / distance * step,
        ];
        if !ctx.engine.set_translation(owner, next) {
            return Status::Failure;
        }

        if distance - step <= radius {
            Status::Success
        } else {
            Status::Running
        }
    }
}

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn length(v: Vec3) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlackboardBoolParams {
    pub key: String,
    pub expected: bool,
}

impl BlackboardBoolParams {
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::blackboard_key("key", ValueKind::Bool).display("Key"),
        FieldDescriptor::parameter("expected", ValueKind::Bool).display("Expected"),
    ];
}

impl Default for BlackboardBoolParams {
    fn default() -> Self {
        Self {
            key: "HasTarget".to_string(),
            expected: true,
        }
    }
}

impl ParameterSet for BlackboardBoolParams {
    fn fields(&self) -> &'static [FieldDescriptor] {
        Self::FIELDS
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "key" => Some(self.key.as_str().into()),
            "expected" => Some(self.expected.into()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ParamError> {
        match (field, value) {
            ("key", Value::String(v)) => self.key = v,
            ("expected", Value::Bool(v)) => self.expected = v,
            (field, value) => return Err(ParamError::rejected(Self::FIELDS, field, &value)),
        }
        Ok(())
    }
}

/// True while a blackboard bool equals `expected`.
#[derive(Debug, Default)]
pub struct BlackboardBoolCondition {
    pub params: BlackboardBoolParams,
}

impl BlackboardBoolCondition {
    pub fn new(key: impl Into<String>, expected: bool) -> Self {
        Self {
            params: BlackboardBoolParams {
                key: key.into(),
                expected,
            },
        }
    }
}

impl ConditionNode for BlackboardBoolCondition {
    fn parameters(&self) -> &dyn ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut dyn ParameterSet {
        &mut self.params
    }

    fn check_condition(&mut self, ctx: &mut NodeContext<'_>) -> bool {
        ctx.blackboard.get_bool(&self.params.key) == self.params.expected
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterLimitParams {
    pub threshold: i32,
    pub counter_key: String,
}

impl CounterLimitParams {
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::parameter("threshold", ValueKind::Int).display("Threshold"),
        FieldDescriptor::blackboard_key("counter_key", ValueKind::Int).display("Counter Key"),
    ];
}

impl Default for CounterLimitParams {
    fn default() -> Self {
        Self {
            threshold: 5,
            counter_key: "Counter".to_string(),
        }
    }
}

impl ParameterSet for CounterLimitParams {
    fn fields(&self) -> &'static [FieldDescriptor] {
        Self::FIELDS
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "threshold" => Some(self.threshold.into()),
            "counter_key" => Some(self.counter_key.as_str().into()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ParamError> {
        match (field, value) {
            ("threshold", Value::Int(v)) => self.threshold = v,
            ("counter_key", Value::String(v)) => self.counter_key = v,
            (field, value) => return Err(ParamError::rejected(Self::FIELDS, field, &value)),
        }
        Ok(())
    }
}

/// Lets its child run while the counter is below `threshold` and counts the
/// child's successes.
#[derive(Debug, Default)]
pub struct CounterLimitDecorator {
    pub params: CounterLimitParams,
}

impl CounterLimitDecorator {
    pub fn new(threshold: i32, counter_key: impl Into<String>) -> Self {
        Self {
            params: CounterLimitParams {
                threshold,
                counter_key: counter_key.into(),
            },
        }
    }
}

impl DecoratorNode for CounterLimitDecorator {
    fn parameters(&self) -> &dyn ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut dyn ParameterSet {
        &mut self.params
    }

    fn can_execute(&mut self, ctx: &mut NodeContext<'_>) -> bool {
        ctx.blackboard.get_int(&self.params.counter_key) < self.params.threshold
    }

    fn on_finished_result(&mut self, ctx: &mut NodeContext<'_>, status: &mut Status) {
        if *status == Status::Success {
            let key = self.params.counter_key.as_str();
            let count = ctx.blackboard.get_int(key);
            ctx.blackboard.set_int(key, count.saturating_add(1));
        }
    }
}
