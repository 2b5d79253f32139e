//! Utility functions for timestamp handling.

pub mod timestamps;

pub use timestamps::{duration_ms, iso_timestamp, now_utc, Timestamp};
