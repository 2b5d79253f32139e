//! Generic retry loop over a single-shot operation.

use super::{RetryPolicy, RetryState};
use std::future::Future;
use std::time::Duration;

/// Outcome of a retry decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry(Duration),
    /// No more retries, give up.
    GiveUp,
    /// Don't retry, the error is not retryable.
    NotRetryable,
}

/// Makes a retry decision after a failed attempt.
///
/// Records the attempt on `state`; the returned delay is the one to sleep
/// before the next attempt.
#[must_use]
pub fn should_retry(
    state: &mut RetryState,
    policy: &RetryPolicy,
    key: &str,
    retryable: bool,
) -> RetryDecision {
    if !state.increment(policy) {
        return RetryDecision::GiveUp;
    }
    if !retryable {
        return RetryDecision::NotRetryable;
    }
    RetryDecision::Retry(state.calculate_delay(key, policy))
}

/// Executes an operation with retry logic, retrying every failure.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, key: &str, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    with_retry_if(policy, key, |_| true, operation).await
}

/// Executes an operation with retry logic.
///
/// Invokes `operation` up to `policy.max_attempts` times, sleeping the
/// policy delay between attempts. Stops at once when `retry_if` rejects an
/// error; otherwise the last error propagates when attempts run out.
pub async fn with_retry_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    key: &str,
    retry_if: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut state = RetryState::new();

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => match should_retry(&mut state, policy, key, retry_if(&e)) {
                RetryDecision::Retry(delay) => {
                    tracing::debug!(
                        key,
                        attempt = state.attempt,
                        delay_ms = crate::utils::duration_ms(delay),
                        error = %e,
                        "Retrying after error"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    tracing::debug!(key, attempts = state.attempt, error = %e, "Retries exhausted");
                    return Err(e);
                }
                RetryDecision::NotRetryable => {
                    tracing::debug!(key, attempt = state.attempt, error = %e, "Error is not retryable");
                    return Err(e);
                }
            },
        }
    }
}
