//! Retry policy with configurable backoff and jitter.

use crate::errors::ConfigError;
use crate::utils::duration_ms;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Minimum per-attempt budget used to derive the retry window under backoff.
pub const BACKOFF_MIN_ATTEMPT_MS: u64 = 1000;
/// Minimum per-attempt budget used to derive the retry window without backoff.
pub const FLAT_MIN_ATTEMPT_MS: u64 = 500;

/// Jitter strategy to prevent thundering herd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// No jitter
    None,
    /// Random from 0 to delay
    Full,
    /// Half fixed, half random
    #[default]
    Equal,
    /// min(max, random(base, prev * 3))
    Decorrelated,
}

/// Retry policy for one invocation.
///
/// Immutable once an invocation starts; the derived retry window is
/// computed from it exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Whether delays grow exponentially.
    #[serde(default = "default_use_backoff")]
    pub use_backoff: bool,
    /// Base delay between attempts in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Growth factor applied per attempt under backoff.
    #[serde(default = "default_delay_multiplier")]
    pub delay_multiplier: f64,
    /// Maximum delay cap in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Jitter applied under backoff.
    #[serde(default)]
    pub jitter: JitterStrategy,
    /// Caller-requested overall timeout in milliseconds.
    #[serde(default)]
    pub explicit_timeout_ms: Option<u64>,
}

fn default_max_attempts() -> usize {
    3
}

fn default_use_backoff() -> bool {
    true
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_delay_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            use_backoff: default_use_backoff(),
            base_delay_ms: default_base_delay_ms(),
            delay_multiplier: default_delay_multiplier(),
            max_delay_ms: default_max_delay_ms(),
            jitter: JitterStrategy::default(),
            explicit_timeout_ms: None,
        }
    }
}

impl RetryPolicy {
    /// Creates a new policy with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Enables or disables exponential backoff.
    #[must_use]
    pub fn with_backoff(mut self, use_backoff: bool) -> Self {
        self.use_backoff = use_backoff;
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay_ms(mut self, delay: u64) -> Self {
        self.base_delay_ms = delay;
        self
    }

    /// Sets the delay multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.delay_multiplier = multiplier;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Sets the jitter strategy.
    #[must_use]
    pub fn with_jitter(mut self, strategy: JitterStrategy) -> Self {
        self.jitter = strategy;
        self
    }

    /// Sets the explicit timeout.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout: u64) -> Self {
        self.explicit_timeout_ms = Some(timeout);
        self
    }

    /// Base delay as a `Duration`.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Maximum delay as a `Duration`.
    #[must_use]
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Wall-clock budget for all setup attempts of one invocation.
    ///
    /// `max(explicit_timeout, (max_attempts + 1) * per_attempt_min)`, with a
    /// per-attempt minimum of 1000ms under backoff and 500ms otherwise.
    #[must_use]
    pub fn retry_window(&self) -> Duration {
        let per_attempt = if self.use_backoff {
            BACKOFF_MIN_ATTEMPT_MS
        } else {
            FLAT_MIN_ATTEMPT_MS
        };
        let floor = (self.max_attempts as u64 + 1).saturating_mul(per_attempt);
        Duration::from_millis(self.explicit_timeout_ms.unwrap_or(0).max(floor))
    }

    /// Un-jittered delay to sleep after failed attempt `attempt` (1-indexed).
    ///
    /// Under backoff: `min(base * multiplier^(attempt-1), max)`.
    /// Otherwise the flat `min(base, max)`.
    #[must_use]
    pub fn nominal_delay(&self, attempt: usize) -> Duration {
        let base = self.base_delay_ms as f64;
        let max = self.max_delay_ms as f64;
        let millis = if self.use_backoff {
            let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
            (base * self.delay_multiplier.powi(exponent)).min(max)
        } else {
            base.min(max)
        };
        Duration::from_millis(millis.max(0.0) as u64)
    }

    /// Validates the policy configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts < 1 {
            return Err(ConfigError::invalid("max_attempts", "must be >= 1"));
        }
        if self.delay_multiplier.is_nan() || self.delay_multiplier < 1.0 {
            return Err(ConfigError::invalid("delay_multiplier", "must be >= 1.0"));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(ConfigError::invalid(
                "max_delay_ms",
                "must not be smaller than base_delay_ms",
            ));
        }
        Ok(())
    }
}

/// State tracking for retry operations.
#[derive(Debug, Default)]
pub struct RetryState {
    /// Attempts made so far.
    pub attempt: usize,
    /// Previous delays for decorrelated jitter.
    previous_delays: HashMap<String, u64>,
}

impl RetryState {
    /// Creates a new retry state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an attempt and returns true if more attempts remain.
    pub fn increment(&mut self, policy: &RetryPolicy) -> bool {
        self.attempt += 1;
        self.attempt < policy.max_attempts
    }

    /// Returns true if retries are exhausted.
    #[must_use]
    pub fn is_exhausted(&self, policy: &RetryPolicy) -> bool {
        self.attempt >= policy.max_attempts
    }

    /// Calculates the delay to sleep after the current attempt.
    ///
    /// Jitter only applies under backoff; the flat delay is used verbatim.
    #[must_use]
    pub fn calculate_delay(&mut self, key: &str, policy: &RetryPolicy) -> Duration {
        let delay = duration_ms(policy.nominal_delay(self.attempt.max(1)));
        if !policy.use_backoff {
            return Duration::from_millis(delay);
        }

        let base = policy.base_delay_ms;
        let max = policy.max_delay_ms;

        let jittered = match policy.jitter {
            JitterStrategy::None => delay,
            JitterStrategy::Full => {
                if delay == 0 {
                    0
                } else {
                    rand::thread_rng().gen_range(0..=delay)
                }
            }
            JitterStrategy::Equal => {
                let half = delay / 2;
                if half == 0 {
                    delay
                } else {
                    half + rand::thread_rng().gen_range(0..=half)
                }
            }
            JitterStrategy::Decorrelated => {
                let prev = self.previous_delays.get(key).copied().unwrap_or(base);
                let upper = (prev.saturating_mul(3)).min(max);
                let new_delay = if upper <= base {
                    base
                } else {
                    rand::thread_rng().gen_range(base..=upper)
                };
                self.previous_delays.insert(key.to_string(), new_delay);
                new_delay
            }
        };

        Duration::from_millis(jittered)
    }
}
