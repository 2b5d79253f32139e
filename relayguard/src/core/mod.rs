//! Core value types.
//!
//! This module contains the event model shared by every other module:
//! - The event kind vocabulary
//! - The stream event value type

mod event;
mod kind;

pub use event::StreamEvent;
pub use kind::EventKind;
