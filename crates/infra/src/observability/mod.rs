//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events; binaries call [`init_tracing`]
//! once at start-up to decide how they are rendered.

use std::str::FromStr;

use jigsaw_domain::JigsawError;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable consulted for the filter directive
pub const LOG_FILTER_ENV: &str = "RUST_LOG";

const DEFAULT_FILTER: &str = "info";

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = JigsawError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(JigsawError::Config(format!("Unknown log format: {}", other))),
        }
    }
}

/// Install the global subscriber, writing to stderr
///
/// Filtering follows `RUST_LOG`, falling back to `info` when it is unset or
/// invalid. Calling this more than once keeps the first subscriber.
pub fn init_tracing(format: LogFormat) {
    let directive = std::env::var(LOG_FILTER_ENV).unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    let filter = build_filter(&directive);

    let result = match format {
        LogFormat::Json => fmt::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .try_init(),
        LogFormat::Text => fmt::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init(),
    };
    // Already initialised (tests, embedding applications)
    drop(result);
}

fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
