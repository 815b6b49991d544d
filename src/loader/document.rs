//! Flat document parsing
//!
//! A document is a single mapping of option keys to scalar values. YAML is the
//! default format; TOML and JSON are chosen by file extension. Scalars are
//! turned into their text form, `null` into the empty string, and sequences of
//! scalars into the comma-separated form read by string-list options. Nested
//! mappings are rejected.

use crate::error::{OptionsError, Result};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Toml,
    Json,
}

impl DocumentFormat {
    /// Pick a format from the file extension, defaulting to YAML.
    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "toml" => DocumentFormat::Toml,
            "json" => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Parse `raw` into a flat key/value mapping.
pub fn parse_document(
    raw: &[u8],
    format: DocumentFormat,
    origin: &str,
) -> Result<BTreeMap<String, String>> {
    let malformed = |reason: String| OptionsError::MalformedDocument {
        origin: origin.to_string(),
        reason,
    };

    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeMap::new());
    }

    match format {
        DocumentFormat::Yaml => parse_yaml(raw).map_err(malformed),
        DocumentFormat::Toml => parse_toml(raw).map_err(malformed),
        DocumentFormat::Json => parse_json(raw).map_err(malformed),
    }
}

type Flat = std::result::Result<BTreeMap<String, String>, String>;

fn nested(key: &str) -> String {
    format!("value of '{}' is not a scalar or a list of scalars", key)
}

fn parse_yaml(raw: &[u8]) -> Flat {
    use serde_yaml::Value;

    let doc: Value = serde_yaml::from_slice(raw).map_err(|e| format!("invalid YAML: {e}"))?;
    let mapping = match doc {
        Value::Null => return Ok(BTreeMap::new()),
        Value::Mapping(mapping) => mapping,
        _ => return Err("top level is not a mapping".to_string()),
    };

    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    let mut flat = BTreeMap::new();
    for (key, value) in &mapping {
        let key = scalar(key).ok_or_else(|| "mapping key is not a scalar".to_string())?;
        let text = match value {
            Value::Sequence(items) => join(items.iter().map(scalar)),
            other => scalar(other),
        }
        .ok_or_else(|| nested(&key))?;
        flat.insert(key, text);
    }
    Ok(flat)
}

fn parse_toml(raw: &[u8]) -> Flat {
    use toml::Value;

    let text = std::str::from_utf8(raw).map_err(|e| format!("document is not UTF-8: {e}"))?;
    let table: toml::Table = toml::from_str(text).map_err(|e| format!("invalid TOML: {e}"))?;

    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            Value::Datetime(d) => Some(d.to_string()),
            Value::Array(_) | Value::Table(_) => None,
        }
    }

    let mut flat = BTreeMap::new();
    for (key, value) in &table {
        let text = match value {
            Value::Array(items) => join(items.iter().map(scalar)),
            other => scalar(other),
        }
        .ok_or_else(|| nested(key))?;
        flat.insert(key.clone(), text);
    }
    Ok(flat)
}

fn parse_json(raw: &[u8]) -> Flat {
    use serde_json::Value;

    let doc: Value = serde_json::from_slice(raw).map_err(|e| format!("invalid JSON: {e}"))?;
    let object = match doc {
        Value::Null => return Ok(BTreeMap::new()),
        Value::Object(object) => object,
        _ => return Err("top level is not an object".to_string()),
    };

    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    let mut flat = BTreeMap::new();
    for (key, value) in &object {
        let text = match value {
            Value::Array(items) => join(items.iter().map(scalar)),
            other => scalar(other),
        }
        .ok_or_else(|| nested(key))?;
        flat.insert(key.clone(), text);
    }
    Ok(flat)
}

fn join(items: impl Iterator<Item = Option<String>>) -> Option<String> {
    let items: Option<Vec<String>> = items.collect();
    items.map(|items| items.join(","))
}
