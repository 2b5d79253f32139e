//! Reliability primitives.
//!
//! This module provides:
//! - `RetryPolicy` with backoff, jitter and the derived retry window
//! - `with_deadline`, a bounded-wait wrapper
//! - `with_retry` / `with_retry_if`, the generic retry loop
//! - `with_graceful_degradation`, deadline + retry + fallback for
//!   non-critical paths

mod deadline;
mod degradation;
mod policy;
mod retry;

pub use deadline::with_deadline;
pub use degradation::with_graceful_degradation;
pub use policy::{
    JitterStrategy, RetryPolicy, RetryState, BACKOFF_MIN_ATTEMPT_MS, FLAT_MIN_ATTEMPT_MS,
};
pub use retry::{should_retry, with_retry, with_retry_if, RetryDecision};
