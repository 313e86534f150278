use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind tag of a blackboard value. Every kind owns an independent key namespace.
///
/// Discriminants match the key-type codes tooling already persists
/// (`0=Float, 1=Int, 2=Bool, 3=String`); `Handle` was added after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueKind {
    Float = 0,
    Int = 1,
    Bool = 2,
    String = 3,
    Handle = 4,
}

impl ValueKind {
    pub const ALL: [ValueKind; 5] = [
        ValueKind::Float,
        ValueKind::Int,
        ValueKind::Bool,
        ValueKind::String,
        ValueKind::Handle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Float => "float",
            ValueKind::Int => "int",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
            ValueKind::Handle => "handle",
        }
    }

    /// The zero value of this kind (what a read of an absent key yields).
    pub fn zero(self) -> Value {
        match self {
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Int => Value::Int(0),
            ValueKind::Bool => Value::Bool(false),
            ValueKind::String => Value::String(String::new()),
            ValueKind::Handle => Value::Handle(0),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically-typed blackboard or parameter value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
    Handle(u64),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Handle(_) => ValueKind::Handle,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Handle(value)
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for bool {}
    impl Sealed for i32 {}
    impl Sealed for f32 {}
    impl Sealed for String {}
    impl Sealed for u64 {}
}

/// Rust types that can live in a blackboard partition.
///
/// Sealed: the set of kinds is closed, and `Default` is the zero value
/// returned for absent keys.
pub trait BlackboardValue: sealed::Sealed + Clone + Default + Into<Value> + 'static {
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<Self>;
}

impl BlackboardValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl BlackboardValue for i32 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl BlackboardValue for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl BlackboardValue for String {
    const KIND: ValueKind = ValueKind::String;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl BlackboardValue for u64 {
    const KIND: ValueKind = ValueKind::Handle;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Handle(v) => Some(*v),
            _ => None,
        }
    }
}
