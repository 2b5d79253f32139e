//! Producer abstraction.
//!
//! A producer is anything that turns a request into a lazy, pull-based
//! sequence of events where each pull may fail. Backends implement
//! [`Producer`]; the coordinator only ever talks to the trait.

mod registry;

pub use registry::ProducerRegistry;

use crate::cancellation::CancellationToken;
use crate::core::StreamEvent;
use crate::errors::ProducerError;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A lazy sequence of producer events. Each item is one pull.
pub type EventStream = BoxStream<'static, Result<StreamEvent, ProducerError>>;

/// One logical request handed to a producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerRequest {
    /// Identifier used for log correlation.
    pub request_id: Uuid,
    /// Opaque request payload.
    pub payload: serde_json::Value,
}

impl ProducerRequest {
    /// Creates a request with a fresh id.
    #[must_use]
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            payload,
        }
    }

    /// Creates a request whose payload is a plain prompt string.
    #[must_use]
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self::new(serde_json::Value::String(prompt.into()))
    }
}

/// A source of streamed events.
///
/// `produce` must be cheap: it returns the sequence without doing any work,
/// and the work happens as the consumer pulls. The consumer may drop the
/// sequence at any time. `cancel` fires when the caller's budget runs out;
/// honoring it is optional.
pub trait Producer: Send + Sync {
    /// Name used in logs and failure messages.
    fn name(&self) -> &str;

    /// Starts a fresh sequence for `request`.
    fn produce(
        &self,
        request: &ProducerRequest,
        resume_token: Option<&str>,
        cancel: Arc<CancellationToken>,
    ) -> EventStream;
}
