//! Span attributes and timing for relay invocations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary attributes recorded when an invocation finishes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationSpanAttributes {
    /// Request ID.
    pub request_id: Option<Uuid>,
    /// Producer name.
    pub producer: Option<String>,
    /// Setup attempts made.
    pub attempts: usize,
    /// How the invocation ended.
    pub outcome: Option<String>,
    /// Duration in milliseconds.
    pub duration_ms: Option<u64>,
    /// Error message if failed.
    pub error: Option<String>,
}

impl InvocationSpanAttributes {
    /// Creates attributes for one invocation.
    #[must_use]
    pub fn new(request_id: Uuid, producer: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id),
            producer: Some(producer.into()),
            ..Default::default()
        }
    }

    /// Sets the attempt count.
    #[must_use]
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }

    /// Sets the outcome.
    #[must_use]
    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }

    /// Logs the attributes as one structured event.
    pub fn record(&self) {
        tracing::info!(
            attempts = self.attempts,
            outcome = self.outcome.as_deref().unwrap_or("unknown"),
            duration_ms = self.duration_ms,
            error = self.error.as_deref(),
            "Invocation finished"
        );
    }
}
