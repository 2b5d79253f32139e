//! Graceful degradation for non-critical paths.

use super::{with_deadline, with_retry_if, RetryPolicy};
use crate::errors::DeadlineExceeded;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Runs `operation` under a per-attempt deadline and the retry loop, and
/// returns `fallback` instead of propagating any unrecovered failure.
///
/// Attempts that time out surface as `E::from(DeadlineExceeded)` and go
/// through `retry_if` like any other error. The optional `observer` sees
/// the final error before it is swallowed.
///
/// Only health and status paths use this; stream coordination must surface
/// its failures.
pub async fn with_graceful_degradation<T, E, F, Fut, P, O>(
    policy: &RetryPolicy,
    key: &str,
    attempt_timeout: Duration,
    fallback: T,
    retry_if: P,
    mut operation: F,
    observer: Option<O>,
) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: From<DeadlineExceeded> + Display,
    O: FnOnce(&E),
{
    let result = with_retry_if(policy, key, retry_if, || {
        let attempt = operation();
        async move {
            match with_deadline(attempt, attempt_timeout).await {
                Ok(inner) => inner,
                Err(elapsed) => Err(E::from(elapsed)),
            }
        }
    })
    .await;

    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "Degrading to fallback value");
            if let Some(observer) = observer {
                observer(&e);
            }
            fallback
        }
    }
}
