//! Failure classification.
//!
//! This module provides:
//! - The stream classifier deciding terminal vs retryable setup failures
//! - The connection transience check used by the health monitor
//! - The schema validation classifier used by the schema-gated relay
//!
//! All functions are pure and match case-insensitively on substrings.

mod markers;

pub use markers::{
    MISSING_MODEL, TERMINAL_MARKERS, TRANSIENT_CONNECTION_MARKERS, VALIDATION_TERMINAL_MARKERS,
};

use markers::contains_any;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of classifying a failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Retrying cannot help.
    Terminal,
    /// Presumed transient.
    Retryable,
}

impl Classification {
    /// Returns true for [`Classification::Terminal`].
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Terminal
    }

    /// Returns true for [`Classification::Retryable`].
    #[must_use]
    pub fn is_retryable(self) -> bool {
        self == Self::Retryable
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal => write!(f, "terminal"),
            Self::Retryable => write!(f, "retryable"),
        }
    }
}

/// Classifies a stream setup failure message.
///
/// Auth, not-found, missing-model and contract markers are terminal;
/// everything else is retryable.
#[must_use]
pub fn classify(message: &str) -> Classification {
    let lowered = message.to_lowercase();
    if contains_any(&lowered, TERMINAL_MARKERS) || MISSING_MODEL.is_match(message) {
        Classification::Terminal
    } else {
        Classification::Retryable
    }
}

/// Classifies a schema validation failure message.
///
/// Terminal when [`classify`] says so, or when the text names an
/// account-level limit (quota, rate limit, billing).
#[must_use]
pub fn classify_validation_failure(message: &str) -> Classification {
    if classify(message).is_terminal()
        || contains_any(&message.to_lowercase(), VALIDATION_TERMINAL_MARKERS)
    {
        Classification::Terminal
    } else {
        Classification::Retryable
    }
}

/// Returns true if a connection failure message looks like a link-level
/// fault worth retrying.
///
/// Unlike [`classify`], anything unrecognised is *not* transient.
#[must_use]
pub fn is_transient_connection_error(message: &str) -> bool {
    contains_any(&message.to_lowercase(), TRANSIENT_CONNECTION_MARKERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_messages() {
        assert_eq!(classify("401 unauthorized"), Classification::Terminal);
        assert_eq!(
            classify("model gpt-9 does not exist"),
            Classification::Terminal
        );
        assert_eq!(
            classify("contract validation failed: bad kind"),
            Classification::Terminal
        );
        assert_eq!(classify("Forbidden"), Classification::Terminal);
        assert_eq!(classify("Permission denied for org"), Classification::Terminal);
        assert_eq!(classify("Invalid credentials supplied"), Classification::Terminal);
        assert_eq!(classify("HTTP 404"), Classification::Terminal);
        assert_eq!(classify("endpoint Not Found"), Classification::Terminal);
    }

    #[test]
    fn test_retryable_messages() {
        assert_eq!(classify("socket hang up"), Classification::Retryable);
        assert_eq!(classify("generic transient glitch"), Classification::Retryable);
        assert_eq!(classify("503 service unavailable"), Classification::Retryable);
        assert_eq!(classify(""), Classification::Retryable);
    }

    #[test]
    fn test_missing_model_pattern_is_case_insensitive() {
        assert!(classify("The MODEL 'claude-x' Does Not Exist").is_terminal());
        assert!(classify("does not exist").is_retryable());
    }

    #[test]
    fn test_validation_classifier_extends_stream_list() {
        assert!(classify_validation_failure("insufficient_quota").is_terminal());
        assert!(classify_validation_failure("Rate limit reached").is_terminal());
        assert!(classify_validation_failure("billing hard limit").is_terminal());
        assert!(classify_validation_failure("401 unauthorized").is_terminal());
        assert!(classify_validation_failure("missing field `title`").is_retryable());

        // The stream classifier does not know about account limits.
        assert!(classify("Rate limit reached").is_retryable());
    }

    #[test]
    fn test_connection_transience_is_a_separate_list() {
        assert!(is_transient_connection_error("read ECONNRESET"));
        assert!(is_transient_connection_error("getaddrinfo ENOTFOUND tools.local"));
        assert!(is_transient_connection_error("request timed out"));
        assert!(is_transient_connection_error("socket hang up"));
        assert!(!is_transient_connection_error("generic transient glitch"));
        assert!(!is_transient_connection_error("401 unauthorized"));
    }

    #[test]
    fn test_classification_display() {
        assert_eq!(Classification::Terminal.to_string(), "terminal");
        assert_eq!(Classification::Retryable.to_string(), "retryable");
    }
}
