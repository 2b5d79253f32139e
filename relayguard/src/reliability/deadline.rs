//! Bounded-wait wrapper.

use crate::errors::DeadlineExceeded;
use std::future::Future;
use std::time::Duration;

/// Races `operation` against a timer.
///
/// When the timer fires first the operation future is dropped, which is
/// best-effort abandonment: work it already handed to other tasks keeps
/// running. The error carries the configured duration.
pub async fn with_deadline<F>(operation: F, duration: Duration) -> Result<F::Output, DeadlineExceeded>
where
    F: Future,
{
    tokio::time::timeout(duration, operation)
        .await
        .map_err(|_| DeadlineExceeded::new(duration))
}
