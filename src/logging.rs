//! Log subscriber setup for applications embedding the registry.
//!
//! The registry itself only emits `tracing` events: reloads at INFO, skipped
//! flags and unregistered document keys at WARN, retained documents at ERROR.
//! Applications that already install a subscriber never need this module.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How [`init_with`] builds the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    /// Fallback level when RUST_LOG is unset.
    pub level: Level,
    /// Restrict the fallback level to this crate's events.
    pub registry_only: bool,
    /// Include event targets in the output.
    pub with_target: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            registry_only: false,
            with_target: false,
        }
    }
}

impl LogOptions {
    pub fn verbose(verbose: bool) -> Self {
        let level = if verbose { Level::DEBUG } else { Level::WARN };
        Self { level, ..Self::default() }
    }

    fn filter(&self) -> EnvFilter {
        let directive = if self.registry_only {
            format!("{}={}", env!("CARGO_CRATE_NAME"), self.level)
        } else {
            self.level.to_string()
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
    }
}

/// Install a stderr subscriber: RUST_LOG when set, else DEBUG if `verbose`, else WARN.
pub fn init(verbose: bool) -> bool {
    init_with(LogOptions::verbose(verbose))
}

/// Install a stderr subscriber built from `options`.
///
/// Returns false when a global subscriber was already installed.
pub fn init_with(options: LogOptions) -> bool {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(options.with_target),
        )
        .with(options.filter())
        .try_init()
        .is_ok()
}
