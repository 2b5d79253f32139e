//! Setup phase: attempt, classify, back off.

use futures::StreamExt;
use tracing::{debug, info, warn};

use super::state::{AttemptOutcome, Completion, CoordinatorState};
use super::{Invocation, EMPTY_ERROR_MESSAGE};
use crate::cancellation::DeadlineTimer;
use crate::classification::{classify, Classification};
use crate::core::StreamEvent;
use crate::errors::RelayError;
use crate::events::names;
use crate::producer::EventStream;
use crate::utils::duration_ms;

impl Invocation {
    /// Runs setup attempt `k` and returns the next state.
    pub(super) async fn attempt(&mut self, k: usize, timer: &DeadlineTimer) -> CoordinatorState {
        if timer.is_expired() {
            return CoordinatorState::SetupFailed(self.timed_out(timer));
        }

        self.attempts = k;
        debug!(attempt = k, max_attempts = self.policy.max_attempts, "Starting setup attempt");
        self.lifecycle(names::ATTEMPT_STARTED, Some(k), None);

        let mut live = self.producer.produce(
            &self.request,
            self.resume_token.as_deref(),
            timer.token().clone(),
        );

        let pulled = tokio::select! {
            biased;
            () = timer.expired() => {
                return CoordinatorState::SetupFailed(self.timed_out(timer));
            }
            item = live.next() => item,
        };

        let outcome = match pulled {
            None => {
                info!(attempt = k, "Producer completed without events");
                return CoordinatorState::Done(Completion::Empty);
            }
            Some(Err(err)) => AttemptOutcome::Failed {
                classification: classify(&err.message),
                message: err.message,
            },
            Some(Ok(event)) => self.inspect_first(event, live),
        };

        match outcome {
            AttemptOutcome::FirstEvent { event, live } => {
                info!(attempt = k, kind = %event.kind, "First event accepted");
                CoordinatorState::FirstEventReady { event, live }
            }
            AttemptOutcome::Failed {
                message,
                classification,
            } => self.after_failure(k, message, classification, timer).await,
        }
    }

    /// Decides whether the first pulled event starts the relay.
    fn inspect_first(&self, event: StreamEvent, live: EventStream) -> AttemptOutcome {
        if let Err(violation) = self.validator.validate(&event) {
            // Contract violations never retry, whatever the text says.
            return AttemptOutcome::Failed {
                message: violation.to_string(),
                classification: Classification::Terminal,
            };
        }

        if event.is_error() {
            let message = match event.content_str() {
                "" => EMPTY_ERROR_MESSAGE.to_string(),
                content => content.to_string(),
            };
            return AttemptOutcome::Failed {
                classification: classify(&message),
                message,
            };
        }

        AttemptOutcome::FirstEvent { event, live }
    }

    async fn after_failure(
        &mut self,
        k: usize,
        message: String,
        classification: Classification,
        timer: &DeadlineTimer,
    ) -> CoordinatorState {
        warn!(attempt = k, %classification, error = %message, "Setup attempt failed");
        self.lifecycle(names::ATTEMPT_FAILED, Some(k), Some(message.clone()));

        if classification.is_terminal() {
            return CoordinatorState::SetupFailed(RelayError::NonRetryable {
                producer: self.producer_name.clone(),
                message,
            });
        }

        self.retry_state.attempt = k;
        if self.retry_state.is_exhausted(&self.policy) {
            return CoordinatorState::SetupFailed(RelayError::RetriesExhausted {
                producer: self.producer_name.clone(),
                attempts: k,
                last_error: message,
            });
        }

        let delay = self
            .retry_state
            .calculate_delay(&self.producer_name, &self.policy);
        debug!(attempt = k, delay_ms = duration_ms(delay), "Retry scheduled");
        self.lifecycle(
            names::RETRY_SCHEDULED,
            Some(k),
            Some(format!("{}ms", duration_ms(delay))),
        );

        tokio::select! {
            biased;
            () = timer.expired() => CoordinatorState::SetupFailed(self.timed_out(timer)),
            () = tokio::time::sleep(delay) => CoordinatorState::Attempting(k + 1),
        }
    }
}
