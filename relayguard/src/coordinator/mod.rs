//! Stream retry coordinator.
//!
//! Wraps a [`Producer`] so that failures before the first event are retried
//! under a [`RetryPolicy`], while everything after the first event is relayed
//! verbatim and reported at most once.

mod relay;
mod setup;
mod state;

#[cfg(test)]
mod integration_tests;

pub use state::{Completion, CoordinatorState};

use std::sync::Arc;

use futures::stream::BoxStream;
use tracing::{info_span, Instrument};

use crate::cancellation::{CancellationToken, DeadlineTimer};
use crate::config::RelayConfig;
use crate::contracts::ContractValidator;
use crate::core::StreamEvent;
use crate::errors::{ConfigError, RelayError};
use crate::events::{names, EventSink, LifecycleEvent, NoOpEventSink};
use crate::observability::InvocationSpanAttributes;
use crate::producer::{Producer, ProducerRegistry, ProducerRequest};
use crate::reliability::{RetryPolicy, RetryState};
use crate::utils::duration_ms;

/// The caller-facing sequence: zero or more non-error events, then either
/// natural completion or exactly one error event.
pub type CoordinatedStream = BoxStream<'static, StreamEvent>;

/// Message used when an in-band error event arrives without content.
pub const EMPTY_ERROR_MESSAGE: &str = "producer emitted an error event without details";

/// Coordinates retries around a single producer.
#[derive(Clone)]
pub struct Coordinator {
    producer: Arc<dyn Producer>,
    policy: RetryPolicy,
    validator: ContractValidator,
    sink: Arc<dyn EventSink>,
}

impl Coordinator {
    /// Creates a coordinator with the default policy and contract
    /// validation enabled.
    #[must_use]
    pub fn new(producer: Arc<dyn Producer>) -> Self {
        Self {
            producer,
            policy: RetryPolicy::default(),
            validator: ContractValidator::enabled(),
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Builds a coordinator from configuration, selecting the producer from
    /// `registry` by the configured name.
    pub fn from_config(config: &RelayConfig, registry: &ProducerRegistry) -> Result<Self, ConfigError> {
        config.validate()?;
        let name = config
            .producer
            .as_deref()
            .ok_or_else(|| ConfigError::invalid("producer", "must name a registered producer"))?;
        let producer = registry.get(name)?;

        Ok(Self::new(producer)
            .with_policy(config.retry.clone())
            .with_validator(ContractValidator::new(config.validate_contract)))
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the contract validator.
    #[must_use]
    pub fn with_validator(mut self, validator: ContractValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Sets the lifecycle event sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The wrapped producer's name.
    #[must_use]
    pub fn producer_name(&self) -> &str {
        self.producer.name()
    }

    /// The configured retry policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The configured contract validator.
    #[must_use]
    pub fn validator(&self) -> ContractValidator {
        self.validator
    }

    /// Invokes the producer under the configured policy.
    pub fn invoke(&self, request: ProducerRequest, resume_token: Option<String>) -> CoordinatedStream {
        self.invoke_with_policy(request, resume_token, self.policy.clone())
    }

    /// Invokes the producer under an explicit policy for this call only.
    ///
    /// Nothing happens until the returned stream is polled. Dropping the
    /// stream releases the deadline timer and the live producer sequence.
    pub fn invoke_with_policy(
        &self,
        request: ProducerRequest,
        resume_token: Option<String>,
        policy: RetryPolicy,
    ) -> CoordinatedStream {
        let invocation = Invocation {
            producer: self.producer.clone(),
            producer_name: self.producer.name().to_string(),
            validator: self.validator,
            sink: self.sink.clone(),
            request,
            resume_token,
            policy,
            retry_state: RetryState::new(),
            attempts: 0,
            failure: None,
        };
        Box::pin(invocation.run())
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("producer", &self.producer.name())
            .field("policy", &self.policy)
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

/// State owned by one invocation.
pub(crate) struct Invocation {
    producer: Arc<dyn Producer>,
    producer_name: String,
    validator: ContractValidator,
    sink: Arc<dyn EventSink>,
    request: ProducerRequest,
    resume_token: Option<String>,
    policy: RetryPolicy,
    retry_state: RetryState,
    attempts: usize,
    failure: Option<String>,
}

impl Invocation {
    fn run(mut self) -> impl futures::Stream<Item = StreamEvent> + Send + 'static {
        async_stream::stream! {
            let span = info_span!(
                "relay.invoke",
                request_id = %self.request.request_id,
                producer = %self.producer_name,
            );
            let started = tokio::time::Instant::now();
            let window = self.policy.retry_window();
            let token = CancellationToken::shared();
            let mut timer = DeadlineTimer::arm(
                window,
                token,
                format!("retry window of {}ms elapsed", duration_ms(window)),
            );

            let mut state = CoordinatorState::Attempting(1);
            loop {
                span.in_scope(|| tracing::trace!(state = state.name(), "Coordinator step"));
                state = match state {
                    CoordinatorState::Attempting(k) => {
                        self.attempt(k, &timer).instrument(span.clone()).await
                    }
                    CoordinatorState::FirstEventReady { event, live } => {
                        timer.disarm();
                        self.lifecycle(names::FIRST_EVENT, None, None);
                        yield event;
                        CoordinatorState::Relaying { live }
                    }
                    CoordinatorState::Relaying { mut live } => {
                        let pulled = self.pull_relayed(&mut live).instrument(span.clone()).await;
                        match pulled {
                            None => CoordinatorState::Done(Completion::Success),
                            Some(Ok(event)) => {
                                yield event;
                                CoordinatorState::Relaying { live }
                            }
                            Some(Err(err)) => {
                                let message = err.to_string();
                                self.lifecycle(names::RELAY_FAILED, None, Some(message.clone()));
                                self.failure = Some(message.clone());
                                yield StreamEvent::error(message);
                                CoordinatorState::Done(Completion::Failed)
                            }
                        }
                    }
                    CoordinatorState::SetupFailed(err) => {
                        timer.disarm();
                        span.in_scope(|| {
                            tracing::warn!(error = %err, timeout = err.is_timeout(), "Stream setup failed");
                        });
                        let message = err.to_string();
                        self.lifecycle(names::SETUP_FAILED, None, Some(message.clone()));
                        self.failure = Some(message.clone());
                        yield StreamEvent::error(message);
                        CoordinatorState::Done(Completion::Failed)
                    }
                    CoordinatorState::Done(completion) => {
                        timer.disarm();
                        let summary = InvocationSpanAttributes::new(
                            self.request.request_id,
                            self.producer_name.as_str(),
                        )
                        .with_attempts(self.attempts)
                        .with_outcome(completion.as_str())
                        .with_duration_ms(duration_ms(started.elapsed()))
                        .with_error(self.failure.take());
                        span.in_scope(|| summary.record());
                        if completion != Completion::Failed {
                            self.lifecycle(names::COMPLETED, None, None);
                        }
                        break;
                    }
                };
            }
        }
    }

    fn lifecycle(&self, name: &str, attempt: Option<usize>, detail: Option<String>) {
        let mut event = LifecycleEvent::new(name, self.request.request_id, self.producer_name.as_str());
        if let Some(attempt) = attempt {
            event = event.with_attempt(attempt);
        }
        if let Some(detail) = detail {
            event = event.with_detail(detail);
        }
        self.sink.try_emit(event);
    }

    /// Builds the timeout failure and makes sure the producer sees the
    /// cancellation even if the timer task has not fired yet.
    fn timed_out(&self, timer: &DeadlineTimer) -> RelayError {
        timer.token().cancel("retry window elapsed");
        RelayError::Timeout {
            producer: self.producer_name.clone(),
            window_ms: duration_ms(timer.window()),
        }
    }
}
