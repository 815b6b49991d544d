//! Document loading with last-known-good fallback
//!
//! Before the first successful load any failure is returned to the caller:
//! there is no usable configuration yet. After that, read failures, parse
//! failures, and malformed values are logged and the registry keeps its
//! current state.

use crate::error::{OptionsError, Result};
use crate::registry::{LoadOutcome, Registry};

pub mod document;
pub mod source;

pub use document::{parse_document, DocumentFormat};
pub use source::{DocumentSource, FileSource, MemorySource};

pub struct Loader<S> {
    source: S,
}

impl<S: DocumentSource> Loader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Read the document and merge it into `registry` if it changed.
    pub fn load(&self, registry: &mut Registry) -> Result<LoadOutcome> {
        let warm = registry.is_loaded();
        match self.try_load(registry) {
            Ok(outcome) => Ok(outcome),
            Err(err) if warm && !err.is_programmer_misuse() => {
                tracing::error!("Failed to reload options from {}: {}", self.source.describe(), err);
                Ok(LoadOutcome::Retained)
            }
            Err(err) => Err(err),
        }
    }

    fn try_load(&self, registry: &mut Registry) -> Result<LoadOutcome> {
        let origin = self.source.describe();
        let raw = self.source.read().map_err(|err| OptionsError::DocumentUnreadable {
            origin: origin.clone(),
            reason: format!("{err:#}"),
        })?;
        registry.load_document(&raw, self.source.format(), &origin)
    }
}
