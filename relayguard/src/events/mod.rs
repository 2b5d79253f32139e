//! Lifecycle telemetry for relay invocations.
//!
//! The coordinator and the schema relay report their decisions to an
//! [`EventSink`]. Sinks observe; they can never fail an invocation.

mod lifecycle;
mod sink;

pub use lifecycle::{names, LifecycleEvent};
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
