//! Error types for relayguard.
//!
//! Every failure the coordinator reports to a caller ends up as the
//! `Display` text of a [`RelayError`] inside a single synthesized `error`
//! event, so the variants below double as the user-visible message catalog.

use std::time::Duration;
use thiserror::Error;

fn attempts_noun(attempts: &usize) -> &'static str {
    if *attempts == 1 {
        "attempt"
    } else {
        "attempts"
    }
}

/// The main error type for relayguard operations.
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    /// The retry window elapsed before a first event arrived.
    #[error("{producer} timed out after {window_ms}ms waiting for its first event")]
    Timeout {
        /// The producer name.
        producer: String,
        /// The retry window in milliseconds.
        window_ms: u64,
    },

    /// All setup attempts failed with retryable errors.
    #[error("{producer} failed after {attempts} {}, last error: {last_error}", attempts_noun(.attempts))]
    RetriesExhausted {
        /// The producer name.
        producer: String,
        /// Number of attempts made.
        attempts: usize,
        /// The last error message observed.
        last_error: String,
    },

    /// A setup attempt failed with a terminal classification.
    #[error("{producer} failed with a non-retryable error: {message}")]
    NonRetryable {
        /// The producer name.
        producer: String,
        /// The final failure message.
        message: String,
    },

    /// A failure after output had reached the caller.
    #[error("{producer} failed mid-stream: {message}")]
    RelayFailed {
        /// The producer name.
        producer: String,
        /// The failure message.
        message: String,
    },

    /// The full payload never passed schema validation.
    #[error("schema validation failed after {attempts} {}: {message}", attempts_noun(.attempts))]
    SchemaValidation {
        /// Number of full invocations made.
        attempts: usize,
        /// The last validation message.
        message: String,
    },

    /// A bounded wait elapsed.
    #[error("{0}")]
    DeadlineExceeded(#[from] DeadlineExceeded),

    /// An event broke the producer contract.
    #[error("{0}")]
    Contract(#[from] ContractViolation),

    /// A producer raised an error.
    #[error("{0}")]
    Producer(#[from] ProducerError),

    /// Configuration was rejected.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns true for failures caused by an elapsed time budget.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::DeadlineExceeded(_))
    }

    /// Returns true for failures that were never retried because retrying
    /// could not help.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NonRetryable { .. } | Self::Contract(_))
    }
}

/// Error raised by a producer while pulling the next event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProducerError {
    /// The error message.
    pub message: String,
}

impl ProducerError {
    /// Creates a new producer error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ProducerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for ProducerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Error reported by a connection liveness check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConnectionError {
    /// The error message.
    pub message: String,
}

impl ConnectionError {
    /// Creates a new connection error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for ConnectionError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<DeadlineExceeded> for ConnectionError {
    fn from(err: DeadlineExceeded) -> Self {
        Self::new(err.to_string())
    }
}

/// Error raised when an operation outlives its bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation timed out after {}ms", duration.as_millis())]
pub struct DeadlineExceeded {
    /// The configured wait.
    pub duration: Duration,
}

impl DeadlineExceeded {
    /// Creates a new deadline error.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

/// Error raised when an event violates the producer contract.
///
/// The message always starts with the `contract validation failed` marker,
/// which the classifier treats as terminal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// The event kind is outside the known vocabulary.
    #[error("contract validation failed: unknown event kind '{kind}'")]
    UnknownKind {
        /// The offending kind.
        kind: String,
    },

    /// A terminal result arrived without a correlation id.
    #[error("contract validation failed: terminal-result event is missing a correlation id")]
    MissingCorrelationId,
}

/// Errors related to configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A field holds an out-of-range value.
    #[error("Invalid configuration: {field} {reason}")]
    Invalid {
        /// The field name.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// No producer is registered under the configured name.
    #[error("Unknown producer: {name}")]
    UnknownProducer {
        /// The configured name.
        name: String,
    },

    /// Configuration text could not be parsed.
    #[error("Configuration parse error: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Creates an invalid-field error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
