//! Tracing setup for binaries.

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Installs the global tracing subscriber.
///
/// Logs go to stderr so stdout stays free for readouts and JSON. The filter
/// comes from `RUST_LOG`, falling back to `default_filter`.
///
/// # Errors
///
/// Returns `InitError::AlreadyInitialised` on a second call, and
/// `InitError::Install` if another subscriber was installed elsewhere.
pub fn init_tracing(default_filter: &str) -> Result<(), InitError> {
    INITIALISED
        .set(())
        .map_err(|()| InitError::AlreadyInitialised)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    Registry::default()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| InitError::Install(e.to_string()))
}

/// Errors emitted when configuring the tracing subscriber.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// `init_tracing` was already called.
    #[error("tracing has already been initialised")]
    AlreadyInitialised,
    /// Another global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_rejected() {
        // The first call may fail with `Install` if the harness already set a
        // subscriber; the second must always report double initialisation.
        let _ = init_tracing("warn");
        assert!(matches!(init_tracing("warn"), Err(InitError::AlreadyInitialised)));
    }
}
