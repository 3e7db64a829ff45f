//! Subscriber setup for the `harness` binary.
//!
//! Library crates only emit events; this is the one place a subscriber is
//! installed. `RUST_LOG` wins unless `--debug` is given.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

use crate::error::HarnessError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn";

#[must_use]
pub fn env_filter(debug: bool) -> EnvFilter {
    if debug {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Events go to stderr so stdout stays JSON.
pub fn init(debug: bool, format: LogFormat) -> Result<(), HarnessError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|err| HarnessError::Logging(err.to_string()))
}
