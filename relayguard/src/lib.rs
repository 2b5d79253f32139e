//! # Relayguard
//!
//! Retry coordination for streaming producers.
//!
//! Relayguard wraps an unreliable, long-running producer of events and
//! shields the caller from transient failures without ever duplicating
//! output the caller has already seen:
//!
//! - **Retry boundary**: setup failures are retried; once the first event
//!   reaches the caller, every failure is reported exactly once
//! - **Classification**: auth, not-found and contract failures are terminal,
//!   everything else is presumed transient
//! - **Bounded waits**: a retry window derived from the policy caps setup
//! - **Connection health**: a sharded cache of endpoint health with a
//!   background staleness sweep
//! - **Schema gating**: optional whole-payload validation with its own
//!   attempt budget
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use relayguard::prelude::*;
//!
//! let coordinator = Coordinator::new(Arc::new(MyProducer::new()))
//!     .with_policy(RetryPolicy::new().with_max_attempts(3));
//!
//! let mut events = coordinator.invoke(ProducerRequest::prompt("hello"), None);
//! while let Some(event) = events.next().await {
//!     println!("{:?}", event);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod classification;
pub mod config;
pub mod contracts;
pub mod coordinator;
pub mod core;
pub mod errors;
pub mod events;
pub mod health;
pub mod observability;
pub mod producer;
pub mod reliability;
pub mod schema_relay;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::{CancellationToken, DeadlineTimer};
    pub use crate::classification::{
        classify, classify_validation_failure, is_transient_connection_error, Classification,
    };
    pub use crate::config::RelayConfig;
    pub use crate::contracts::ContractValidator;
    pub use crate::coordinator::{CoordinatedStream, Coordinator};
    pub use crate::core::{EventKind, StreamEvent};
    pub use crate::errors::{
        ConfigError, ConnectionError, ContractViolation, DeadlineExceeded, ProducerError,
        RelayError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::health::{ConnectionHealthMonitor, HealthMonitorConfig, HealthRecord};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::producer::{EventStream, Producer, ProducerRegistry, ProducerRequest};
    pub use crate::reliability::{
        with_deadline, with_graceful_degradation, with_retry, with_retry_if, JitterStrategy,
        RetryPolicy,
    };
    pub use crate::schema_relay::{PayloadValidator, SchemaGatedRelay};
    pub use crate::utils::{iso_timestamp, Timestamp};
}
