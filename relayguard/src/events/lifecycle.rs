//! Lifecycle event record.

use crate::utils::iso_timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle event names.
pub mod names {
    /// A setup attempt is starting.
    pub const ATTEMPT_STARTED: &str = "relay.attempt_started";
    /// A setup attempt failed.
    pub const ATTEMPT_FAILED: &str = "relay.attempt_failed";
    /// A retry was scheduled after a backoff delay.
    pub const RETRY_SCHEDULED: &str = "relay.retry_scheduled";
    /// Setup gave up.
    pub const SETUP_FAILED: &str = "relay.setup_failed";
    /// The first event reached the caller; retries are over.
    pub const FIRST_EVENT: &str = "relay.first_event";
    /// The live sequence failed after output began.
    pub const RELAY_FAILED: &str = "relay.relay_failed";
    /// The live sequence completed.
    pub const COMPLETED: &str = "relay.completed";
    /// A full payload failed schema validation.
    pub const SCHEMA_VALIDATION_FAILED: &str = "schema.validation_failed";
    /// The schema relay is re-running the whole invocation.
    pub const SCHEMA_RETRY_SCHEDULED: &str = "schema.retry_scheduled";
}

/// One lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// The event name, one of [`names`].
    pub name: String,
    /// The request the event belongs to.
    pub request_id: Uuid,
    /// The producer involved.
    pub producer: String,
    /// The attempt number, when meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<usize>,
    /// Free-form detail, usually an error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// When the event occurred (ISO 8601).
    pub timestamp: String,
}

impl LifecycleEvent {
    /// Creates a new lifecycle event.
    #[must_use]
    pub fn new(name: &str, request_id: Uuid, producer: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            request_id,
            producer: producer.into(),
            attempt: None,
            detail: None,
            timestamp: iso_timestamp(),
        }
    }

    /// Sets the attempt number.
    #[must_use]
    pub fn with_attempt(mut self, attempt: usize) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Sets the detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
