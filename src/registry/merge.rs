//! Merging documents and flag overrides into registered slots
//!
//! A merge is staged before it is committed: every value is converted first,
//! and only when all conversions succeed are slots written. A malformed value
//! therefore never leaves the registry half-updated.

use super::option::OptionEntry;
use super::{Phase, Registry};
use crate::error::Result;
use crate::loader::document::{parse_document, DocumentFormat};
use crate::types::Value;
use crate::utils::document_digest;
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::PoisonError;

/// What a load did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    /// First successful load. Callbacks were not invoked.
    Initial,
    /// The document changed and callbacks were invoked.
    Updated,
    /// The document was byte-identical to the previous one.
    Unchanged,
    /// The load failed after a previous success; the prior state was kept.
    Retained,
}

#[derive(Debug, Default)]
struct MergeReport {
    from_document: usize,
    from_default: usize,
    unknown: usize,
}

impl Registry {
    /// Load a YAML document held in memory.
    pub fn load_bytes(&mut self, raw: &[u8]) -> Result<LoadOutcome> {
        self.load_document(raw, DocumentFormat::Yaml, "<memory>")
    }

    /// Load a YAML document from a string. Intended for tests and embedding
    /// where no file is involved.
    pub fn populate_from_str(&mut self, yaml: &str) -> Result<LoadOutcome> {
        self.load_bytes(yaml.as_bytes())
    }

    pub(crate) fn load_document(
        &mut self,
        raw: &[u8],
        format: DocumentFormat,
        origin: &str,
    ) -> Result<LoadOutcome> {
        if self.raw_document.as_deref() == Some(raw) {
            tracing::debug!(origin, "options document unchanged");
            return Ok(LoadOutcome::Unchanged);
        }

        let values = parse_document(raw, format, origin)?;
        let first_load = self.raw_document.is_none();
        let report = self.merge(values)?;

        self.raw_document = Some(raw.to_vec());
        self.phase = Phase::Loaded;
        tracing::info!(
            origin,
            digest = %document_digest(raw),
            from_document = report.from_document,
            from_default = report.from_default,
            unknown = report.unknown,
            "loaded options document"
        );

        if first_load {
            return Ok(LoadOutcome::Initial);
        }
        self.notify();
        Ok(LoadOutcome::Updated)
    }

    /// Merge a parsed flat document without change detection or callbacks.
    ///
    /// Registered keys present in `values` take the converted value, the rest
    /// fall back to their defaults. Leftover keys become unknown entries.
    pub fn populate(&mut self, values: BTreeMap<String, String>) -> Result<()> {
        self.merge(values).map(|_| ())
    }

    fn merge(&mut self, mut values: BTreeMap<String, String>) -> Result<MergeReport> {
        let mut staged: Vec<(String, Option<(Value, String)>)> = Vec::new();
        for (key, entry) in self.concrete() {
            match values.remove(key.as_str()) {
                Some(raw) => {
                    let value = Value::parse(key, entry.option_type(), &raw)?;
                    staged.push((key.clone(), Some((value, raw))));
                }
                None => staged.push((key.clone(), None)),
            }
        }

        let mut report = MergeReport::default();
        for (key, change) in staged {
            let Some(entry) = self.options.get_mut(&key) else {
                continue;
            };
            match change {
                Some((value, raw)) => {
                    entry.binding.store(&key, value)?;
                    entry.raw = Some(raw);
                    report.from_document += 1;
                }
                None => {
                    entry.binding.reset_to_default();
                    entry.raw = None;
                    report.from_default += 1;
                }
            }
        }

        self.options.retain(|key, entry| !entry.binding.is_unknown() || values.contains_key(key));
        for (key, raw) in values {
            report.unknown += 1;
            match self.options.entry(key) {
                Entry::Occupied(mut occupied) => occupied.get_mut().raw = Some(raw),
                Entry::Vacant(vacant) => {
                    tracing::warn!(key = %vacant.key(), "options document key is not registered");
                    vacant.insert(OptionEntry::unknown(raw));
                }
            }
        }

        Ok(report)
    }

    /// Write command-line overrides straight into their slots.
    ///
    /// Keys without a registered option are ignored. Returns the keys applied.
    pub(crate) fn apply_overrides(&mut self, overrides: Vec<(String, String)>) -> Result<Vec<String>> {
        let mut staged = Vec::new();
        for (key, raw) in overrides {
            let Some(entry) = self.options.get(&key).filter(|e| !e.binding.is_unknown()) else {
                tracing::debug!(key = %key, "ignoring flag without a registered option");
                continue;
            };
            let value = Value::parse(&key, entry.option_type(), &raw)?;
            staged.push((key, value, raw));
        }

        let mut applied = Vec::with_capacity(staged.len());
        for (key, value, raw) in staged {
            if let Some(entry) = self.options.get_mut(&key) {
                entry.binding.store(&key, value)?;
                entry.raw = Some(raw);
                applied.push(key);
            }
        }

        self.phase = Phase::FlagsApplied;
        tracing::debug!(applied = applied.len(), "applied command-line overrides");
        Ok(applied)
    }

    fn notify(&self) {
        let mut callbacks = self.callbacks.lock().unwrap_or_else(PoisonError::into_inner);
        for callback in callbacks.iter_mut() {
            callback(self);
        }
    }
}
