//! Error taxonomy for the option registry
//!
//! Every fallible operation returns [`Result`]. Whether an error terminates the
//! process is the caller's choice: binaries call [`OrAbort::or_abort`], tests
//! inspect the value.

use crate::types::OptionType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to read options document from {origin}: {reason}")]
    DocumentUnreadable { origin: String, reason: String },

    #[error("options document from {origin} is not a flat key/value mapping: {reason}")]
    MalformedDocument { origin: String, reason: String },

    #[error("cannot convert {raw:?} to type '{option_type}' for option '{key}'")]
    MalformedValue { key: String, option_type: OptionType, raw: String },

    #[error("option key '{key}' is not registered")]
    Unregistered { key: String },

    #[error("option '{key}' is registered as '{registered}', not '{requested}'")]
    TypeMismatch { key: String, registered: OptionType, requested: OptionType },

    #[error("option '{key}' is already bound to a different slot")]
    SlotConflict { key: String },

    #[error("option '{key}' already has description {existing:?}, cannot use {requested:?}")]
    DescriptionConflict { key: String, existing: String, requested: String },

    #[error("option '{key}' already has default value {existing}, cannot use {requested}")]
    DefaultConflict { key: String, existing: String, requested: String },
}

impl OptionsError {
    /// True for errors that indicate a defect in the calling code rather than
    /// in the configuration it was fed.
    pub fn is_programmer_misuse(&self) -> bool {
        matches!(
            self,
            Self::Unregistered { .. }
                | Self::TypeMismatch { .. }
                | Self::SlotConflict { .. }
                | Self::DescriptionConflict { .. }
                | Self::DefaultConflict { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, OptionsError>;

/// Terminate the process on error.
///
/// This is the default policy for a service that cannot run without trustworthy
/// configuration: the error is logged and the process exits with status 1.
pub trait OrAbort<T> {
    fn or_abort(self) -> T;
}

impl<T> OrAbort<T> for Result<T> {
    fn or_abort(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::error!("fatal options error: {}", err);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misuse_classification() {
        let misuse = OptionsError::Unregistered { key: "workers".into() };
        assert!(misuse.is_programmer_misuse());

        let runtime = OptionsError::MalformedValue {
            key: "workers".into(),
            option_type: OptionType::Int,
            raw: "seven".into(),
        };
        assert!(!runtime.is_programmer_misuse());
    }

    #[test]
    fn malformed_value_message_names_key_and_type() {
        let err = OptionsError::MalformedValue {
            key: "workers".into(),
            option_type: OptionType::Int,
            raw: "seven".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"seven\""));
        assert!(msg.contains("'int'"));
        assert!(msg.contains("'workers'"));
    }
}
