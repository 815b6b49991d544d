//! Type dispatch between raw option text and typed values
//!
//! Every supported primitive has three text forms:
//! - raw text, as it appears in a document or on the command line ([`Value::parse`])
//! - display text, used by listings and error messages ([`Value::display`])
//! - seed text, the raw form used to seed command-line flags ([`Value::raw_text`])

use crate::error::{OptionsError, Result};
use crate::utils::{join_list, split_list};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

pub mod duration;

pub use duration::{format_duration, parse_duration};

/// Rendered in place of a secret value everywhere.
pub const REDACTED: &str = "<REDACTED>";

/// Type tag of a registered option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    String,
    StringList,
    Int,
    #[serde(rename = "uint64")]
    UInt64,
    Bool,
    Duration,
    /// Same storage as `String`, never displayed.
    Secret,
    /// A document key nobody has registered yet.
    Unknown,
}

impl OptionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::StringList => "string list",
            Self::Int => "int",
            Self::UInt64 => "uint64",
            Self::Bool => "bool",
            Self::Duration => "duration",
            Self::Secret => "secret",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    StringList(Vec<String>),
    Int(i64),
    UInt64(u64),
    Bool(bool),
    Duration(Duration),
    Secret(String),
    /// Raw text kept verbatim for an unregistered key.
    Unknown(String),
}

impl Value {
    /// Convert raw text into a value of `option_type`.
    ///
    /// `key` is only used to build the error.
    pub fn parse(key: &str, option_type: OptionType, raw: &str) -> Result<Value> {
        let malformed = || OptionsError::MalformedValue {
            key: key.to_string(),
            option_type,
            raw: raw.to_string(),
        };

        let value = match option_type {
            OptionType::String => Value::String(raw.to_string()),
            OptionType::Secret => Value::Secret(raw.to_string()),
            OptionType::StringList => Value::StringList(split_list(raw)),
            OptionType::Int => Value::Int(raw.parse().map_err(|_| malformed())?),
            OptionType::UInt64 => {
                // `u64::from_str` tolerates a leading '+'; base-10 digits only here.
                if raw.starts_with('+') {
                    return Err(malformed());
                }
                Value::UInt64(raw.parse().map_err(|_| malformed())?)
            }
            OptionType::Bool => Value::Bool(parse_bool(raw).ok_or_else(malformed)?),
            OptionType::Duration => Value::Duration(parse_duration(raw).ok_or_else(malformed)?),
            OptionType::Unknown => Value::Unknown(raw.to_string()),
        };
        Ok(value)
    }

    pub fn option_type(&self) -> OptionType {
        match self {
            Value::String(_) => OptionType::String,
            Value::StringList(_) => OptionType::StringList,
            Value::Int(_) => OptionType::Int,
            Value::UInt64(_) => OptionType::UInt64,
            Value::Bool(_) => OptionType::Bool,
            Value::Duration(_) => OptionType::Duration,
            Value::Secret(_) => OptionType::Secret,
            Value::Unknown(_) => OptionType::Unknown,
        }
    }

    /// Human-facing text. Secrets are always redacted.
    pub fn display(&self) -> String {
        match self {
            Value::String(s) => format!("{s:?}"),
            Value::StringList(items) if items.is_empty() => "[]".to_string(),
            Value::StringList(items) => {
                let quoted: Vec<String> = items.iter().map(|item| format!("{item:?}")).collect();
                format!("[{}]", quoted.join(", "))
            }
            Value::Int(i) => i.to_string(),
            Value::UInt64(u) => u.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Duration(d) => format_duration(*d),
            Value::Secret(_) => REDACTED.to_string(),
            Value::Unknown(raw) => format!("<UNREGISTERED> {raw:?}"),
        }
    }

    /// Raw text that parses back to this value. Secrets are redacted here too,
    /// since this text ends up in `--help` output.
    pub fn raw_text(&self) -> String {
        match self {
            Value::String(s) | Value::Unknown(s) => s.clone(),
            Value::StringList(items) => join_list(items),
            Value::Int(i) => i.to_string(),
            Value::UInt64(u) => u.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Duration(d) => format_duration(*d),
            Value::Secret(_) => REDACTED.to_string(),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
