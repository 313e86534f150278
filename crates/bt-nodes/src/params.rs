use std::collections::BTreeMap;
use std::fmt;

use bt_core::{Value, ValueKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Field name -> current value, as persisted inside a tree asset.
pub type ParamMap = BTreeMap<String, Value>;

/// How a declared field is exposed to tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTag {
    /// Plain configuration value of the given kind.
    Parameter(ValueKind),
    /// Name of a blackboard key holding a value of the given kind.
    /// The field itself always stores a string.
    BlackboardKey(ValueKind),
}

/// Static description of one tagged field of a [`ParameterSet`].
///
/// Fields a parameter set does not describe are invisible to introspection
/// and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Empty means "use `name`".
    pub display_name: &'static str,
    pub tag: FieldTag,
}

impl FieldDescriptor {
    pub const fn parameter(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            display_name: "",
            tag: FieldTag::Parameter(kind),
        }
    }

    pub const fn blackboard_key(name: &'static str, key_kind: ValueKind) -> Self {
        Self {
            name,
            display_name: "",
            tag: FieldTag::BlackboardKey(key_kind),
        }
    }

    pub const fn display(mut self, display_name: &'static str) -> Self {
        self.display_name = display_name;
        self
    }

    pub fn resolved_display_name(&self) -> &'static str {
        if self.display_name.is_empty() {
            self.name
        } else {
            self.display_name
        }
    }

    /// Kind of the value the field itself holds.
    pub fn storage_kind(&self) -> ValueKind {
        match self.tag {
            FieldTag::Parameter(kind) => kind,
            FieldTag::BlackboardKey(_) => ValueKind::String,
        }
    }

    pub fn is_blackboard_key(&self) -> bool {
        matches!(self.tag, FieldTag::BlackboardKey(_))
    }

    pub fn info(&self) -> ParameterFieldInfo {
        ParameterFieldInfo {
            name: self.name.to_string(),
            display_name: self.resolved_display_name().to_string(),
            is_blackboard_key: self.is_blackboard_key(),
            blackboard_key_type: match self.tag {
                FieldTag::BlackboardKey(kind) => Some(kind),
                FieldTag::Parameter(_) => None,
            },
        }
    }
}

/// Read-only field description handed to editors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParameterFieldInfo {
    pub name: String,
    pub display_name: String,
    pub is_blackboard_key: bool,
    pub blackboard_key_type: Option<ValueKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("parameter `{field}` expects a {expected} value, got {found}")]
    TypeMismatch {
        field: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("parameter `{0}` is not declared")]
    UnknownField(String),

    #[error("parameter sets declare different fields")]
    IncompatibleSet,
}

impl ParamError {
    /// Error for a write `ParameterSet::set` could not apply.
    pub fn rejected(fields: &[FieldDescriptor], field: &str, value: &Value) -> Self {
        match fields.iter().find(|d| d.name == field) {
            Some(descriptor) => ParamError::TypeMismatch {
                field: field.to_string(),
                expected: descriptor.storage_kind(),
                found: value.kind(),
            },
            None => ParamError::UnknownField(field.to_string()),
        }
    }
}

/// A node's declared, introspectable configuration record.
///
/// Implementors describe their tagged fields once in [`Self::fields`] (a
/// `'static` table, usually a `const`) and provide typed access by name. The
/// introspection and (de)serialization methods are derived from that table.
pub trait ParameterSet: fmt::Debug {
    /// Tagged fields in declaration order.
    fn fields(&self) -> &'static [FieldDescriptor];

    fn get(&self, field: &str) -> Option<Value>;

    /// Write one field. Only called with a value of the field's storage kind.
    fn set(&mut self, field: &str, value: Value) -> Result<(), ParamError>;

    fn field_infos(&self) -> Vec<ParameterFieldInfo> {
        self.fields().iter().map(FieldDescriptor::info).collect()
    }

    /// Current value of every tagged field.
    fn serialize(&self) -> ParamMap {
        self.fields()
            .iter()
            .filter_map(|d| self.get(d.name).map(|v| (d.name.to_string(), v)))
            .collect()
    }

    /// Partial update: fields named in `values` are written, unknown entries
    /// are ignored, everything else keeps its value.
    ///
    /// All matching entries are type-checked before any field is written.
    fn deserialize(&mut self, values: &ParamMap) -> Result<(), ParamError> {
        let fields = self.fields();
        for descriptor in fields {
            if let Some(value) = values.get(descriptor.name) {
                let expected = descriptor.storage_kind();
                if value.kind() != expected {
                    return Err(ParamError::TypeMismatch {
                        field: descriptor.name.to_string(),
                        expected,
                        found: value.kind(),
                    });
                }
            }
        }

        for descriptor in fields {
            if let Some(value) = values.get(descriptor.name) {
                self.set(descriptor.name, value.clone())?;
            }
        }
        Ok(())
    }
}

/// Parameter set of nodes without configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoParams;

impl ParameterSet for NoParams {
    fn fields(&self) -> &'static [FieldDescriptor] {
        &[]
    }

    fn get(&self, _field: &str) -> Option<Value> {
        None
    }

    fn set(&mut self, field: &str, _value: Value) -> Result<(), ParamError> {
        Err(ParamError::UnknownField(field.to_string()))
    }
}
