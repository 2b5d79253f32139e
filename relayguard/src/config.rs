//! Relay configuration.
//!
//! Values arrive from an external collaborator (file, environment, host
//! application) and are validated once before a coordinator is built.

use crate::errors::ConfigError;
use crate::health::HealthMonitorConfig;
use crate::reliability::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Environment variable overriding `retry.max_attempts`.
pub const ENV_MAX_ATTEMPTS: &str = "RELAYGUARD_MAX_ATTEMPTS";
/// Environment variable overriding `retry.explicit_timeout_ms`.
pub const ENV_TIMEOUT_MS: &str = "RELAYGUARD_TIMEOUT_MS";
/// Environment variable overriding `retry.use_backoff`.
pub const ENV_USE_BACKOFF: &str = "RELAYGUARD_USE_BACKOFF";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Retry policy for stream setup.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Connection health thresholds.
    #[serde(default)]
    pub health: HealthMonitorConfig,
    /// Whether events are checked against the producer contract.
    #[serde(default = "default_validate_contract")]
    pub validate_contract: bool,
    /// Attempt budget of the schema-gated relay.
    #[serde(default = "default_schema_attempts")]
    pub schema_attempts: usize,
    /// Registry name of the producer to use.
    #[serde(default)]
    pub producer: Option<String>,
}

fn default_validate_contract() -> bool {
    true
}

fn default_schema_attempts() -> usize {
    2
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            health: HealthMonitorConfig::default(),
            validate_contract: default_validate_contract(),
            schema_attempts: default_schema_attempts(),
            producer: None,
        }
    }
}

impl RelayConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the producer name.
    #[must_use]
    pub fn with_producer(mut self, name: impl Into<String>) -> Self {
        self.producer = Some(name.into());
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its
    /// value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MAX_ATTEMPTS) {
            self.retry.max_attempts = parse_env(ENV_MAX_ATTEMPTS, &value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            self.retry.explicit_timeout_ms = Some(parse_env(ENV_TIMEOUT_MS, &value)?);
        }
        if let Some(value) = lookup(ENV_USE_BACKOFF) {
            self.retry.use_backoff = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::invalid(ENV_USE_BACKOFF, "must be a boolean")),
            };
        }
        Ok(())
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retry.validate()?;
        self.health.validate()?;
        if self.schema_attempts < 1 {
            return Err(ConfigError::invalid("schema_attempts", "must be >= 1"));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, format!("cannot parse '{value}'")))
}
