//! optreg: a typed, reloadable option registry
//!
//! Options are registered with a caller-owned [`Slot`], a default, and a
//! description. A [`Loader`] feeds flat key/value documents into the
//! [`Registry`] for the lifetime of the process, resetting absent keys to their
//! defaults and notifying callbacks when the document changes. A [`FlagBridge`]
//! exposes every option as a command-line flag and writes explicit overrides
//! back into the slots.

pub mod error;
pub mod flags;
pub mod loader;
pub mod logging;
pub mod registry;
pub mod slot;
pub mod types;
mod utils;

pub use error::{OptionsError, OrAbort, Result};
pub use flags::FlagBridge;
pub use loader::{DocumentFormat, DocumentSource, FileSource, Loader, MemorySource};
pub use registry::{LoadOutcome, OptionInfo, Phase, Registry, UpdateCallback};
pub use slot::Slot;
pub use types::{OptionType, Value};
