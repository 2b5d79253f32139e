//! Observability utilities.
//!
//! Structured logs go through `tracing`; hosts install a subscriber with
//! [`init_tracing`] or bring their own.

mod subscriber;
mod tracing;

pub use subscriber::{build_subscriber, env_filter, init_tracing, try_init_tracing, LogFormat};
pub use tracing::InvocationSpanAttributes;
