//! Deadline timer that cancels a token when a time budget elapses.

use super::CancellationToken;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// A timer armed at construction that cancels its token once the window
/// elapses.
///
/// Disarming aborts the timer task without touching the token. Dropping the
/// timer disarms it, so every exit path of the owner releases the timer.
#[derive(Debug)]
pub struct DeadlineTimer {
    deadline: Instant,
    window: Duration,
    token: Arc<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

impl DeadlineTimer {
    /// Arms a timer for `window` from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm(window: Duration, token: Arc<CancellationToken>, reason: impl Into<String>) -> Self {
        let deadline = Instant::now() + window;
        let reason = reason.into();
        let target = token.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            target.cancel(reason);
        });

        Self {
            deadline,
            window,
            token,
            handle: Some(handle),
        }
    }

    /// The instant the window closes.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// The configured window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// The token this timer cancels.
    #[must_use]
    pub fn token(&self) -> &Arc<CancellationToken> {
        &self.token
    }

    /// Returns true once the window has closed, whether or not the timer
    /// task has run yet.
    ///
    /// Only the clock decides: holders of the token may cancel it for their
    /// own reasons without closing the window.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Returns true until the timer is disarmed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops the timer. Idempotent.
    pub fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Resolves when the window closes.
    pub async fn expired(&self) {
        tokio::time::sleep_until(self.deadline).await;
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}
