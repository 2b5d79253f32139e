//! Connection health monitor.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{HealthMonitorConfig, HealthRecord};
use crate::classification::is_transient_connection_error;
use crate::errors::{ConfigError, ConnectionError};
use crate::reliability::{with_graceful_degradation, RetryPolicy};

/// Tracks the health of long-lived endpoints.
///
/// Records live in a sharded map, so updates to one id never block another.
/// A background sweep drops records that have not been touched for
/// `stale_after`, whatever their health.
#[derive(Debug)]
pub struct ConnectionHealthMonitor {
    records: DashMap<String, HealthRecord>,
    config: HealthMonitorConfig,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl Default for ConnectionHealthMonitor {
    fn default() -> Self {
        Self::with_valid_config(HealthMonitorConfig::default())
    }
}

impl ConnectionHealthMonitor {
    /// Creates a monitor with the given thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if any threshold is zero.
    pub fn new(config: HealthMonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    /// Creates a shared monitor, ready for [`Self::start_monitoring`].
    ///
    /// # Errors
    ///
    /// Returns an error if any threshold is zero.
    pub fn shared(config: HealthMonitorConfig) -> Result<Arc<Self>, ConfigError> {
        Self::new(config).map(Arc::new)
    }

    fn with_valid_config(config: HealthMonitorConfig) -> Self {
        Self {
            records: DashMap::new(),
            config,
            sweeper: Mutex::new(None),
        }
    }

    /// The configured thresholds.
    #[must_use]
    pub fn config(&self) -> &HealthMonitorConfig {
        &self.config
    }

    /// Records one check result for `id`.
    ///
    /// A success resets the error count and keeps the last error text. A
    /// failure increments the count and replaces the text when one is given.
    pub fn update_health(&self, id: &str, connected: bool, error: Option<&str>) {
        let mut record = self
            .records
            .entry(id.to_string())
            .or_insert_with(HealthRecord::unseen);
        let was_healthy = self.record_is_healthy(&record, Instant::now());
        record.record(connected, error);
        let healthy = self.record_is_healthy(&record, Instant::now());

        match (was_healthy, healthy) {
            (true, false) => warn!(
                server = id,
                error_count = record.error_count,
                error = ?record.last_error,
                "Connection became unhealthy"
            ),
            (false, true) => info!(server = id, "Connection healthy"),
            _ => debug!(server = id, connected, error_count = record.error_count, "Health updated"),
        }
    }

    /// Returns true iff `id` is tracked, connected, below the error
    /// threshold, and was checked within the healthy window.
    #[must_use]
    pub fn is_healthy(&self, id: &str) -> bool {
        self.records
            .get(id)
            .is_some_and(|record| self.record_is_healthy(&record, Instant::now()))
    }

    /// Returns every tracked id that is not healthy.
    #[must_use]
    pub fn get_unhealthy_servers(&self) -> HashSet<String> {
        let now = Instant::now();
        self.records
            .iter()
            .filter(|entry| !self.record_is_healthy(entry.value(), now))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Returns a snapshot of all records.
    #[must_use]
    pub fn get_all_health(&self) -> HashMap<String, HealthRecord> {
        self.records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Returns a copy of the record for `id`.
    #[must_use]
    pub fn get_health(&self, id: &str) -> Option<HealthRecord> {
        self.records.get(id).map(|record| record.clone())
    }

    /// Stops tracking `id`. Returns true if it was tracked.
    pub fn remove_server(&self, id: &str) -> bool {
        self.records.remove(id).is_some()
    }

    /// Number of tracked ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops records older than `stale_after`. Returns how many were removed.
    pub fn sweep_stale(&self) -> usize {
        let now = Instant::now();
        let stale_after = self.config.stale_after();
        let before = self.records.len();
        self.records
            .retain(|_, record| now.duration_since(record.last_check) <= stale_after);
        let removed = before.saturating_sub(self.records.len());
        if removed > 0 {
            debug!(removed, remaining = self.records.len(), "Swept stale health records");
        }
        removed
    }

    /// Starts the background sweep. Returns false if it was already running.
    ///
    /// The sweep task only holds a weak reference, so dropping the last
    /// `Arc` ends it.
    pub fn start_monitoring(self: &Arc<Self>) -> bool {
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() {
            return false;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.config.sweep_interval();
        *sweeper = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(monitor) = weak.upgrade() else {
                    break;
                };
                monitor.sweep_stale();
            }
        }));
        info!(interval_ms = self.config.sweep_interval_ms, "Health monitoring started");
        true
    }

    /// Stops the background sweep. Returns false if it was not running.
    pub fn stop_monitoring(&self) -> bool {
        match self.sweeper.lock().take() {
            Some(handle) => {
                handle.abort();
                info!("Health monitoring stopped");
                true
            }
            None => false,
        }
    }

    /// Returns true while the background sweep is running.
    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    /// Runs a liveness check for `id` and records the outcome.
    ///
    /// Each attempt is bounded by `probe_timeout`; only transient connection
    /// failures are retried. Returns the resulting health verdict.
    pub async fn probe<F, Fut>(&self, id: &str, policy: &RetryPolicy, probe_fn: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, ConnectionError>>,
    {
        let last_error: Mutex<Option<String>> = Mutex::new(None);
        let connected = with_graceful_degradation(
            policy,
            id,
            self.config.probe_timeout(),
            false,
            |err: &ConnectionError| is_transient_connection_error(&err.message),
            probe_fn,
            Some(|err: &ConnectionError| {
                *last_error.lock() = Some(err.message.clone());
            }),
        )
        .await;

        let error = last_error.into_inner();
        self.update_health(id, connected, error.as_deref());
        self.is_healthy(id)
    }

    fn record_is_healthy(&self, record: &HealthRecord, now: Instant) -> bool {
        record.connected
            && record.error_count < self.config.max_errors
            && now.duration_since(record.last_check) < self.config.healthy_window()
    }
}

impl Drop for ConnectionHealthMonitor {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}
