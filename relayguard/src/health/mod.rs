//! Connection health tracking for long-lived endpoints.
//!
//! This module provides:
//! - Per-endpoint health records with an error threshold and healthy window
//! - A background sweep that bounds the map by dropping stale records
//! - A probe helper that retries only transient connection failures

mod config;
mod monitor;
mod record;

pub use config::HealthMonitorConfig;
pub use monitor::ConnectionHealthMonitor;
pub use record::HealthRecord;
