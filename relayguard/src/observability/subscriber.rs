//! tracing-subscriber installation.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::{SubscriberInitExt as _, TryInitError};
use tracing_subscriber::EnvFilter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable compact lines.
    #[default]
    Plain,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" | "compact" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Builds the filter from `RUST_LOG`, falling back to `info`.
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Builds the subscriber without installing it.
///
/// Useful with [`tracing::subscriber::with_default`] for scoped logging.
#[must_use]
pub fn build_subscriber(format: LogFormat) -> Box<dyn Subscriber + Send + Sync> {
    let registry = tracing_subscriber::registry().with(env_filter());
    match format {
        LogFormat::Plain => Box::new(
            registry.with(tracing_subscriber::fmt::layer().compact().with_target(false)),
        ),
        LogFormat::Json => Box::new(
            registry.with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            ),
        ),
    }
}

/// Installs the global subscriber.
///
/// Fails if a global subscriber is already set.
pub fn try_init_tracing(format: LogFormat) -> Result<(), TryInitError> {
    build_subscriber(format).try_init()
}

/// Installs the global subscriber, leaving an existing one in place.
pub fn init_tracing(format: LogFormat) {
    if let Err(e) = try_init_tracing(format) {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }
}
