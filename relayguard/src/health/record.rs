//! Per-endpoint health records.

use crate::utils::{now_utc, Timestamp};
use serde::Serialize;
use tokio::time::Instant;

/// Last known health of one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthRecord {
    /// Whether the last check succeeded.
    pub connected: bool,
    /// When the record was last updated (monotonic).
    #[serde(skip)]
    pub last_check: Instant,
    /// When the record was last updated (wall clock, for reporting).
    pub last_check_at: Timestamp,
    /// Failures since the last success.
    pub error_count: u32,
    /// Most recent failure text. Kept across successes.
    pub last_error: Option<String>,
}

impl HealthRecord {
    pub(crate) fn unseen() -> Self {
        Self {
            connected: false,
            last_check: Instant::now(),
            last_check_at: now_utc(),
            error_count: 0,
            last_error: None,
        }
    }

    /// Applies one check result.
    pub(crate) fn record(&mut self, connected: bool, error: Option<&str>) {
        self.last_check = Instant::now();
        self.last_check_at = now_utc();
        self.connected = connected;
        if connected {
            self.error_count = 0;
        } else {
            self.error_count = self.error_count.saturating_add(1);
            if let Some(error) = error {
                self.last_error = Some(error.to_string());
            }
        }
    }

    /// Time since the last update.
    #[must_use]
    pub fn age(&self) -> std::time::Duration {
        self.last_check.elapsed()
    }
}
