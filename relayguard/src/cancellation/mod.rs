//! Cooperative cancellation.
//!
//! This module provides:
//! - CancellationToken, observed (never enforced) by producers and the coordinator
//! - DeadlineTimer, which cancels a token when a retry window closes

mod deadline;
mod token;

pub use deadline::DeadlineTimer;
pub use token::CancellationToken;
