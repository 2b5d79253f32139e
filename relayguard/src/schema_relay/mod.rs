//! Schema-gated relay.
//!
//! Runs the coordinator to completion, validates the concatenated `data`
//! content, and repeats the whole invocation when validation fails with a
//! retryable message. Because the payload must be complete before it can be
//! judged, output is buffered and a retry re-runs the producer from scratch,
//! side effects included. The attempt budget bounds how often that happens.

mod validator;

#[cfg(test)]
pub use validator::MockPayloadValidator;
pub use validator::{JsonPayloadValidator, PayloadValidator};

use std::sync::Arc;

use futures::StreamExt;
use tracing::{info, warn};

use crate::classification::classify_validation_failure;
use crate::config::RelayConfig;
use crate::coordinator::{CoordinatedStream, Coordinator};
use crate::core::{EventKind, StreamEvent};
use crate::errors::{ConfigError, RelayError};
use crate::events::{names, EventSink, LifecycleEvent, NoOpEventSink};
use crate::producer::{ProducerRegistry, ProducerRequest};
use crate::reliability::{should_retry, RetryDecision, RetryPolicy, RetryState};

/// Default attempt budget for schema validation.
pub const DEFAULT_SCHEMA_ATTEMPTS: usize = 2;

/// Wraps a coordinator with whole-payload validation.
#[derive(Clone)]
pub struct SchemaGatedRelay {
    coordinator: Coordinator,
    validator: Arc<dyn PayloadValidator>,
    policy: RetryPolicy,
    sink: Arc<dyn EventSink>,
}

impl SchemaGatedRelay {
    /// Creates a relay with the default attempt budget. Delays between
    /// attempts follow the coordinator's policy.
    pub fn new(coordinator: Coordinator, validator: Arc<dyn PayloadValidator>) -> Self {
        let policy = coordinator
            .policy()
            .clone()
            .with_max_attempts(DEFAULT_SCHEMA_ATTEMPTS);
        Self {
            coordinator,
            validator,
            policy,
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Builds the relay and its coordinator from configuration.
    pub fn from_config(
        config: &RelayConfig,
        registry: &ProducerRegistry,
        validator: Arc<dyn PayloadValidator>,
    ) -> Result<Self, ConfigError> {
        let coordinator = Coordinator::from_config(config, registry)?;
        Ok(Self::new(coordinator, validator).with_attempts(config.schema_attempts))
    }

    /// Sets the schema attempt budget.
    #[must_use]
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.policy.max_attempts = attempts;
        self
    }

    /// Sets the policy used between schema attempts.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the lifecycle event sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The schema attempt budget.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.policy.max_attempts
    }

    /// Invokes the relay and yields the accepted events, or exactly one
    /// error event.
    pub fn invoke(&self, request: ProducerRequest, resume_token: Option<String>) -> CoordinatedStream {
        let relay = self.clone();
        Box::pin(async_stream::stream! {
            match relay.run(request, resume_token).await {
                Ok(events) => {
                    for event in events {
                        yield event;
                    }
                }
                Err(err) => yield StreamEvent::error(err.to_string()),
            }
        })
    }

    /// Runs passes until one validates, validation fails terminally, or the
    /// budget is spent.
    ///
    /// A pass that ends in an error event is returned as-is, without
    /// validation.
    pub async fn run(
        &self,
        request: ProducerRequest,
        resume_token: Option<String>,
    ) -> Result<Vec<StreamEvent>, RelayError> {
        let mut state = RetryState::new();
        let key = format!("schema:{}", self.coordinator.producer_name());

        loop {
            let events: Vec<StreamEvent> = self
                .coordinator
                .invoke(request.clone(), resume_token.clone())
                .collect()
                .await;

            if events.iter().any(StreamEvent::is_error) {
                return Ok(events);
            }

            let payload = concat_data(&events);
            let Err(message) = self.validator.validate(&payload) else {
                info!(attempts = state.attempt + 1, "Schema validation passed");
                return Ok(events);
            };

            let classification = classify_validation_failure(&message);
            warn!(
                request_id = %request.request_id,
                %classification,
                error = %message,
                "Schema validation failed"
            );
            self.lifecycle(names::SCHEMA_VALIDATION_FAILED, &request, state.attempt + 1, &message);

            match should_retry(&mut state, &self.policy, &key, classification.is_retryable()) {
                RetryDecision::Retry(delay) => {
                    self.lifecycle(
                        names::SCHEMA_RETRY_SCHEDULED,
                        &request,
                        state.attempt,
                        &format!("{}ms", delay.as_millis()),
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp | RetryDecision::NotRetryable => {
                    return Err(RelayError::SchemaValidation {
                        attempts: state.attempt,
                        message,
                    });
                }
            }
        }
    }

    fn lifecycle(&self, name: &str, request: &ProducerRequest, attempt: usize, detail: &str) {
        self.sink.try_emit(
            LifecycleEvent::new(name, request.request_id, self.coordinator.producer_name())
                .with_attempt(attempt)
                .with_detail(detail),
        );
    }
}

impl std::fmt::Debug for SchemaGatedRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaGatedRelay")
            .field("coordinator", &self.coordinator)
            .field("attempts", &self.policy.max_attempts)
            .finish_non_exhaustive()
    }
}

/// Concatenates the content of every `data` event in arrival order.
#[must_use]
pub fn concat_data(events: &[StreamEvent]) -> String {
    events
        .iter()
        .filter(|event| event.kind == EventKind::Data)
        .map(StreamEvent::content_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;
    use crate::testing::{assert_ends_with_error, fast_policy, ScriptedProducer};
    use mockall::Sequence;
    use pretty_assertions::assert_eq;

    fn payload_events(parts: &[&str]) -> Vec<StreamEvent> {
        let mut events: Vec<StreamEvent> = parts.iter().map(|p| StreamEvent::data(*p)).collect();
        events.push(StreamEvent::terminal_result("corr-1"));
        events
    }

    fn relay(producer: &Arc<ScriptedProducer>, validator: MockPayloadValidator) -> SchemaGatedRelay {
        let coordinator = Coordinator::new(producer.clone()).with_policy(fast_policy(3));
        SchemaGatedRelay::new(coordinator, Arc::new(validator))
    }

    async fn run(relay: &SchemaGatedRelay) -> Vec<StreamEvent> {
        relay
            .invoke(ProducerRequest::prompt("give me json"), None)
            .collect()
            .await
    }

    #[test]
    fn test_concat_data_ignores_other_kinds() {
        let events = vec![
            StreamEvent::thinking("hmm"),
            StreamEvent::data("{\"a\":"),
            StreamEvent::tool_call("lookup", None),
            StreamEvent::data("1}"),
        ];
        assert_eq!(concat_data(&events), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_valid_payload_is_replayed_in_order() {
        let events = payload_events(&["{\"title\":", "\"ok\"}"]);
        let producer = Arc::new(ScriptedProducer::new("mock").then_emit(events.clone()));
        let mut validator = MockPayloadValidator::new();
        validator
            .expect_validate()
            .withf(|payload| payload == "{\"title\":\"ok\"}")
            .times(1)
            .returning(|_| Ok(()));

        let output = run(&relay(&producer, validator)).await;

        assert_eq!(output, events);
        assert_eq!(producer.invocations(), 1);
    }

    #[tokio::test]
    async fn test_retryable_failure_reruns_from_scratch() {
        let producer = Arc::new(
            ScriptedProducer::new("mock")
                .then_emit(payload_events(&["{\"tit"]))
                .then_emit(payload_events(&["{\"title\":\"ok\"}"])),
        );
        let mut validator = MockPayloadValidator::new();
        let mut seq = Sequence::new();
        validator
            .expect_validate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err("missing field `title`".to_string()));
        validator
            .expect_validate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let sink = Arc::new(CollectingEventSink::new());

        let output = run(&relay(&producer, validator).with_sink(sink.clone())).await;

        assert_eq!(output, payload_events(&["{\"title\":\"ok\"}"]));
        assert_eq!(producer.invocations(), 2);
        assert_eq!(
            sink.names(),
            vec![names::SCHEMA_VALIDATION_FAILED, names::SCHEMA_RETRY_SCHEDULED]
        );
    }

    #[tokio::test]
    async fn test_terminal_failure_yields_single_error() {
        let producer = Arc::new(ScriptedProducer::new("mock").then_emit(payload_events(&["x"])));
        let mut validator = MockPayloadValidator::new();
        validator
            .expect_validate()
            .times(1)
            .returning(|_| Err("insufficient_quota".to_string()));

        let output = run(&relay(&producer, validator)).await;

        assert_eq!(output.len(), 1);
        assert_eq!(
            assert_ends_with_error(&output),
            "schema validation failed after 1 attempt: insufficient_quota"
        );
        assert_eq!(producer.invocations(), 1);
    }

    #[tokio::test]
    async fn test_budget_bounds_schema_retries() {
        let producer = Arc::new(ScriptedProducer::new("mock").then_emit(payload_events(&["x"])));
        let mut validator = MockPayloadValidator::new();
        validator
            .expect_validate()
            .times(3)
            .returning(|_| Err("expected object".to_string()));

        let output = run(&relay(&producer, validator).with_attempts(3)).await;

        let message = assert_ends_with_error(&output);
        assert_eq!(output.len(), 1);
        assert_eq!(message, "schema validation failed after 3 attempts: expected object");
        assert_eq!(producer.invocations(), 3);
    }

    #[tokio::test]
    async fn test_coordinator_error_is_replayed_without_validation() {
        let producer = Arc::new(ScriptedProducer::new("mock").then_emit(vec![
            StreamEvent::data("partial"),
            StreamEvent::error("stream reset"),
        ]));
        let mut validator = MockPayloadValidator::new();
        validator.expect_validate().times(0);

        let output = run(&relay(&producer, validator)).await;

        assert_eq!(output[0], StreamEvent::data("partial"));
        assert_eq!(
            assert_ends_with_error(&output),
            "mock failed mid-stream: stream reset"
        );
        assert_eq!(producer.invocations(), 1);
    }

    #[tokio::test]
    async fn test_from_config_uses_schema_attempts() {
        let registry = ProducerRegistry::new();
        registry.register(Arc::new(
            ScriptedProducer::new("json").then_emit(payload_events(&["{}"])),
        ));
        let mut config = RelayConfig::default().with_producer("json").with_retry(fast_policy(2));
        config.schema_attempts = 4;

        let relay = SchemaGatedRelay::from_config(&config, &registry, Arc::new(JsonPayloadValidator))
            .unwrap();

        assert_eq!(relay.attempts(), 4);
        let events = relay
            .run(ProducerRequest::prompt("x"), None)
            .await
            .unwrap();
        assert_eq!(events, payload_events(&["{}"]));
    }
}
