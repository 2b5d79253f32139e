//! Fixtures for coordinator tests.

use crate::core::StreamEvent;
use crate::reliability::{JitterStrategy, RetryPolicy};
use futures::{Stream, StreamExt};

/// A policy with tiny deterministic delays and a generous window.
#[must_use]
pub fn fast_policy(max_attempts: usize) -> RetryPolicy {
    RetryPolicy::new()
        .with_max_attempts(max_attempts)
        .with_base_delay_ms(1)
        .with_max_delay_ms(10)
        .with_jitter(JitterStrategy::None)
        .with_timeout_ms(60_000)
}

/// Drains a coordinated stream into a vector.
pub async fn collect_events<S>(stream: S) -> Vec<StreamEvent>
where
    S: Stream<Item = StreamEvent>,
{
    stream.collect().await
}
