//! The option registry
//!
//! Options are registered against a [`Registry`] with a caller-owned [`Slot`],
//! a default, and a description. Registration and document loading may happen
//! in any order: document keys nobody has registered yet are kept as unknown
//! entries and converted when a registration claims them. Registration is
//! idempotent as long as the same slot, description, and default are supplied.

use crate::error::{OptionsError, Result};
use crate::slot::Slot;
use crate::types::{OptionType, Value};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

mod merge;
pub(crate) mod option;

pub use merge::LoadOutcome;
use option::{Binding, OptionEntry};

/// Invoked after every load that changed the document, except the first.
pub type UpdateCallback = Box<dyn FnMut(&Registry) + Send>;

/// Where the registry is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Empty,
    Loaded,
    FlagsApplied,
}

/// A snapshot of one option for introspection. Secret values are redacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionInfo {
    pub key: String,
    pub option_type: OptionType,
    pub default: Option<String>,
    pub current: String,
    pub description: String,
}

pub struct Registry {
    raw_document: Option<Vec<u8>>,
    options: BTreeMap<String, OptionEntry>,
    // Held while callbacks run; a poisoned lock is recovered.
    callbacks: Mutex<Vec<UpdateCallback>>,
    phase: Phase,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            raw_document: None,
            options: BTreeMap::new(),
            callbacks: Mutex::new(Vec::new()),
            phase: Phase::Empty,
        }
    }

    /// Append a callback. Callbacks run in registration order.
    pub fn register_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&Registry) + Send + 'static,
    {
        self.callbacks
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(callback));
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True once a document has been loaded successfully.
    pub fn is_loaded(&self) -> bool {
        self.raw_document.is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.options.get(key).is_some_and(|entry| !entry.binding.is_unknown())
    }

    pub fn option_type(&self, key: &str) -> Option<OptionType> {
        self.options.get(key).map(OptionEntry::option_type)
    }

    /// Document keys that no registration has claimed.
    pub fn unknown_keys(&self) -> Vec<String> {
        self.options
            .iter()
            .filter(|(_, entry)| entry.binding.is_unknown())
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn register(&mut self, key: &str, description: &str, binding: Binding) -> Result<()> {
        match self.options.get_mut(key) {
            None => {
                binding.reset_to_default();
                tracing::debug!(key, option_type = %binding.option_type(), "registered option");
                self.options.insert(key.to_string(), OptionEntry::registered(binding, description));
            }
            Some(entry) if entry.binding.is_unknown() => {
                let raw = entry.raw.clone().unwrap_or_default();
                let value = Value::parse(key, binding.option_type(), &raw)?;
                binding.store(key, value)?;
                tracing::debug!(
                    key,
                    option_type = %binding.option_type(),
                    "promoted unknown document key to registered option"
                );
                *entry = OptionEntry {
                    binding,
                    description: description.to_string(),
                    raw: Some(raw),
                };
            }
            Some(entry) => entry.check_rebind(key, &binding, description)?,
        }
        Ok(())
    }

    fn lookup(&self, key: &str, requested: OptionType) -> Result<&OptionEntry> {
        let entry = self
            .options
            .get(key)
            .filter(|entry| !entry.binding.is_unknown())
            .ok_or_else(|| OptionsError::Unregistered { key: key.to_string() })?;
        let registered = entry.option_type();
        if registered != requested {
            return Err(OptionsError::TypeMismatch { key: key.to_string(), registered, requested });
        }
        Ok(entry)
    }

    /// One line per registered option: `key: (default) "description"`.
    pub fn descriptions(&self) -> String {
        let mut out = String::from(
            "The below options are available. They are listed in the format 'option: (default value) \"Description\"'.\n",
        );
        for (key, entry) in self.concrete() {
            let default = entry.binding.default_value().map(|v| v.display()).unwrap_or_default();
            out.push_str(&format!("{}: ({}) {:?}\n", key, default, entry.description));
        }
        out
    }

    /// One line per registered option: `key: value`. Secrets are redacted.
    pub fn current_values(&self) -> String {
        let mut out = String::from("Currently configured option values:\n");
        for (key, entry) in self.concrete() {
            out.push_str(&format!("{}: {}\n", key, entry.current_value().display()));
        }
        out
    }

    /// Every option, unknown entries included, sorted by key.
    pub fn entries(&self) -> Vec<OptionInfo> {
        self.options
            .iter()
            .map(|(key, entry)| OptionInfo {
                key: key.clone(),
                option_type: entry.option_type(),
                default: entry.binding.default_value().map(|v| v.display()),
                current: entry.current_value().display(),
                description: entry.description.clone(),
            })
            .collect()
    }

    pub(crate) fn concrete(&self) -> impl Iterator<Item = (&String, &OptionEntry)> {
        self.options.iter().filter(|(_, entry)| !entry.binding.is_unknown())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("options", &self.options.keys().collect::<Vec<_>>())
            .field("callbacks", &self.callbacks.try_lock().map(|callbacks| callbacks.len()).ok())
            .field("phase", &self.phase)
            .finish()
    }
}

macro_rules! typed_options {
    ($($variant:ident, $ty:ty, $register:ident, $get:ident;)*) => {
        impl Registry {
            $(
                #[doc = concat!("Register a `", stringify!($variant), "` option under `key`.")]
                ///
                /// Returns the slot bound to the key, which is `slot` itself.
                pub fn $register(
                    &mut self,
                    slot: &Slot<$ty>,
                    key: &str,
                    default: $ty,
                    description: &str,
                ) -> Result<Slot<$ty>> {
                    let binding = Binding::$variant { slot: slot.clone(), default };
                    self.register(key, description, binding)?;
                    self.$get(key)
                }

                #[doc = concat!("Get the slot of the `", stringify!($variant), "` option under `key`.")]
                pub fn $get(&self, key: &str) -> Result<Slot<$ty>> {
                    match &self.lookup(key, OptionType::$variant)?.binding {
                        Binding::$variant { slot, .. } => Ok(slot.clone()),
                        other => Err(OptionsError::TypeMismatch {
                            key: key.to_string(),
                            registered: other.option_type(),
                            requested: OptionType::$variant,
                        }),
                    }
                }
            )*
        }
    };
}

typed_options! {
    String, String, register_string, get_string;
    Secret, String, register_secret, get_secret;
    StringList, Vec<String>, register_string_list, get_string_list;
    Int, i64, register_int, get_int;
    UInt64, u64, register_uint64, get_uint64;
    Bool, bool, register_bool, get_bool;
    Duration, Duration, register_duration, get_duration;
}
