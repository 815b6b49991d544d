//! Option descriptors: a typed slot plus its default, raw text, and description

use crate::error::{OptionsError, Result};
use crate::slot::Slot;
use crate::types::{OptionType, Value};
use std::time::Duration;

/// The typed half of an option. Each variant pairs the caller's slot with a
/// default of the same native type, so a slot can never hold a value of the
/// wrong type.
pub(crate) enum Binding {
    String { slot: Slot<String>, default: String },
    Secret { slot: Slot<String>, default: String },
    StringList { slot: Slot<Vec<String>>, default: Vec<String> },
    Int { slot: Slot<i64>, default: i64 },
    UInt64 { slot: Slot<u64>, default: u64 },
    Bool { slot: Slot<bool>, default: bool },
    Duration { slot: Slot<Duration>, default: Duration },
    Unknown,
}

impl Binding {
    pub fn option_type(&self) -> OptionType {
        match self {
            Binding::String { .. } => OptionType::String,
            Binding::Secret { .. } => OptionType::Secret,
            Binding::StringList { .. } => OptionType::StringList,
            Binding::Int { .. } => OptionType::Int,
            Binding::UInt64 { .. } => OptionType::UInt64,
            Binding::Bool { .. } => OptionType::Bool,
            Binding::Duration { .. } => OptionType::Duration,
            Binding::Unknown => OptionType::Unknown,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Binding::Unknown)
    }

    pub fn default_value(&self) -> Option<Value> {
        let value = match self {
            Binding::String { default, .. } => Value::String(default.clone()),
            Binding::Secret { default, .. } => Value::Secret(default.clone()),
            Binding::StringList { default, .. } => Value::StringList(default.clone()),
            Binding::Int { default, .. } => Value::Int(*default),
            Binding::UInt64 { default, .. } => Value::UInt64(*default),
            Binding::Bool { default, .. } => Value::Bool(*default),
            Binding::Duration { default, .. } => Value::Duration(*default),
            Binding::Unknown => return None,
        };
        Some(value)
    }

    pub fn current_value(&self) -> Option<Value> {
        let value = match self {
            Binding::String { slot, .. } => Value::String(slot.get()),
            Binding::Secret { slot, .. } => Value::Secret(slot.get()),
            Binding::StringList { slot, .. } => Value::StringList(slot.get()),
            Binding::Int { slot, .. } => Value::Int(slot.get()),
            Binding::UInt64 { slot, .. } => Value::UInt64(slot.get()),
            Binding::Bool { slot, .. } => Value::Bool(slot.get()),
            Binding::Duration { slot, .. } => Value::Duration(slot.get()),
            Binding::Unknown => return None,
        };
        Some(value)
    }

    /// Move `value` into the slot. The value must match the binding's type.
    pub fn store(&self, key: &str, value: Value) -> Result<()> {
        match (self, value) {
            (Binding::String { slot, .. }, Value::String(v)) => slot.set(v),
            (Binding::Secret { slot, .. }, Value::Secret(v)) => slot.set(v),
            (Binding::StringList { slot, .. }, Value::StringList(v)) => slot.set(v),
            (Binding::Int { slot, .. }, Value::Int(v)) => slot.set(v),
            (Binding::UInt64 { slot, .. }, Value::UInt64(v)) => slot.set(v),
            (Binding::Bool { slot, .. }, Value::Bool(v)) => slot.set(v),
            (Binding::Duration { slot, .. }, Value::Duration(v)) => slot.set(v),
            (binding, value) => {
                return Err(OptionsError::TypeMismatch {
                    key: key.to_string(),
                    registered: binding.option_type(),
                    requested: value.option_type(),
                })
            }
        }
        Ok(())
    }

    pub fn reset_to_default(&self) {
        match self {
            Binding::String { slot, default } | Binding::Secret { slot, default } => {
                slot.set(default.clone())
            }
            Binding::StringList { slot, default } => slot.set(default.clone()),
            Binding::Int { slot, default } => slot.set(*default),
            Binding::UInt64 { slot, default } => slot.set(*default),
            Binding::Bool { slot, default } => slot.set(*default),
            Binding::Duration { slot, default } => slot.set(*default),
            Binding::Unknown => {}
        }
    }

    /// Both bindings write to the same storage. Callers compare types first.
    pub fn same_slot(&self, other: &Binding) -> bool {
        match (self, other) {
            (Binding::String { slot: a, .. }, Binding::String { slot: b, .. })
            | (Binding::Secret { slot: a, .. }, Binding::Secret { slot: b, .. }) => a.same_as(b),
            (Binding::StringList { slot: a, .. }, Binding::StringList { slot: b, .. }) => {
                a.same_as(b)
            }
            (Binding::Int { slot: a, .. }, Binding::Int { slot: b, .. }) => a.same_as(b),
            (Binding::UInt64 { slot: a, .. }, Binding::UInt64 { slot: b, .. }) => a.same_as(b),
            (Binding::Bool { slot: a, .. }, Binding::Bool { slot: b, .. }) => a.same_as(b),
            (Binding::Duration { slot: a, .. }, Binding::Duration { slot: b, .. }) => {
                a.same_as(b)
            }
            _ => false,
        }
    }
}

pub(crate) struct OptionEntry {
    pub binding: Binding,
    pub description: String,
    /// Text the current value came from; `None` when it came from the default.
    pub raw: Option<String>,
}

impl OptionEntry {
    pub fn registered(binding: Binding, description: &str) -> Self {
        Self { binding, description: description.to_string(), raw: None }
    }

    pub fn unknown(raw: String) -> Self {
        Self { binding: Binding::Unknown, description: String::new(), raw: Some(raw) }
    }

    pub fn option_type(&self) -> OptionType {
        self.binding.option_type()
    }

    /// Current value; unknown entries report their raw text.
    pub fn current_value(&self) -> Value {
        self.binding
            .current_value()
            .unwrap_or_else(|| Value::Unknown(self.raw.clone().unwrap_or_default()))
    }

    /// Check that re-registering `key` with `binding` and `description`
    /// changes nothing.
    pub fn check_rebind(&self, key: &str, binding: &Binding, description: &str) -> Result<()> {
        let registered = self.option_type();
        let requested = binding.option_type();
        if registered != requested {
            return Err(OptionsError::TypeMismatch { key: key.to_string(), registered, requested });
        }
        if !self.binding.same_slot(binding) {
            return Err(OptionsError::SlotConflict { key: key.to_string() });
        }
        if self.description != description {
            return Err(OptionsError::DescriptionConflict {
                key: key.to_string(),
                existing: self.description.clone(),
                requested: description.to_string(),
            });
        }
        let existing = self.binding.default_value();
        let proposed = binding.default_value();
        if existing != proposed {
            let display = |value: Option<Value>| value.map(|v| v.display()).unwrap_or_default();
            return Err(OptionsError::DefaultConflict {
                key: key.to_string(),
                existing: display(existing),
                requested: display(proposed),
            });
        }
        Ok(())
    }
}
