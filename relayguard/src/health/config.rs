//! Health monitor configuration.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Thresholds for the connection health monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthMonitorConfig {
    /// Consecutive errors at which an endpoint becomes unhealthy.
    #[serde(default = "default_max_errors")]
    pub max_errors: u32,
    /// How long a successful check counts as healthy, in milliseconds.
    #[serde(default = "default_healthy_window_ms")]
    pub healthy_window_ms: u64,
    /// Age after which the sweep drops a record, in milliseconds.
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,
    /// Interval between background sweeps, in milliseconds.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// Per-attempt deadline for liveness probes, in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_max_errors() -> u32 {
    3
}

fn default_healthy_window_ms() -> u64 {
    5 * 60 * 1000
}

fn default_stale_after_ms() -> u64 {
    10 * 60 * 1000
}

fn default_sweep_interval_ms() -> u64 {
    60 * 1000
}

fn default_probe_timeout_ms() -> u64 {
    5000
}

impl Default for HealthMonitorConfig {
    fn default() -> Self {
        Self {
            max_errors: default_max_errors(),
            healthy_window_ms: default_healthy_window_ms(),
            stale_after_ms: default_stale_after_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl HealthMonitorConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sweep interval.
    #[must_use]
    pub fn with_sweep_interval_ms(mut self, interval: u64) -> Self {
        self.sweep_interval_ms = interval;
        self
    }

    /// Sets the stale threshold.
    #[must_use]
    pub fn with_stale_after_ms(mut self, stale_after: u64) -> Self {
        self.stale_after_ms = stale_after;
        self
    }

    /// Gets the healthy window as Duration.
    #[must_use]
    pub fn healthy_window(&self) -> Duration {
        Duration::from_millis(self.healthy_window_ms)
    }

    /// Gets the stale threshold as Duration.
    #[must_use]
    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }

    /// Gets the sweep interval as Duration.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Gets the probe timeout as Duration.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Validates the thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("health.max_errors", u64::from(self.max_errors)),
            ("health.healthy_window_ms", self.healthy_window_ms),
            ("health.stale_after_ms", self.stale_after_ms),
            ("health.sweep_interval_ms", self.sweep_interval_ms),
            ("health.probe_timeout_ms", self.probe_timeout_ms),
        ];
        for (field, value) in fields {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be > 0"));
            }
        }
        Ok(())
    }
}
