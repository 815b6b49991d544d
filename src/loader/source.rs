//! Where option documents come from

use super::document::DocumentFormat;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// A source of option documents.
///
/// `read` is a single synchronous call; timeouts and retries belong to the
/// caller's reload policy.
pub trait DocumentSource {
    fn read(&self) -> Result<Vec<u8>>;

    /// Human-readable origin used in logs and errors.
    fn describe(&self) -> String;

    fn format(&self) -> DocumentFormat {
        DocumentFormat::Yaml
    }
}

/// A document on disk, typically a mounted configmap.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: DocumentFormat,
}

impl FileSource {
    /// The format is picked from the file extension.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = DocumentFormat::from_path(&path);
        Self { path, format }
    }

    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSource for FileSource {
    fn read(&self) -> Result<Vec<u8>> {
        fs::read(&self.path)
            .with_context(|| format!("Failed reading options file: {}", self.path.display()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn format(&self) -> DocumentFormat {
        self.format
    }
}

/// An in-memory document that can be swapped or made unavailable.
///
/// Clones share the same document, so a test or an embedding application can
/// keep a handle while a [`Loader`](super::Loader) owns another.
#[derive(Debug, Clone)]
pub struct MemorySource {
    document: Arc<Mutex<std::result::Result<Vec<u8>, String>>>,
    format: DocumentFormat,
}

impl MemorySource {
    pub fn new(document: impl Into<Vec<u8>>) -> Self {
        Self {
            document: Arc::new(Mutex::new(Ok(document.into()))),
            format: DocumentFormat::Yaml,
        }
    }

    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }

    pub fn set(&self, document: impl Into<Vec<u8>>) {
        *self.document.lock().unwrap_or_else(PoisonError::into_inner) = Ok(document.into());
    }

    /// Make subsequent reads fail with `reason`.
    pub fn set_unavailable(&self, reason: impl Into<String>) {
        *self.document.lock().unwrap_or_else(PoisonError::into_inner) = Err(reason.into());
    }
}

impl DocumentSource for MemorySource {
    fn read(&self) -> Result<Vec<u8>> {
        match &*self.document.lock().unwrap_or_else(PoisonError::into_inner) {
            Ok(document) => Ok(document.clone()),
            Err(reason) => Err(anyhow::anyhow!("{}", reason)),
        }
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }

    fn format(&self) -> DocumentFormat {
        self.format
    }
}
