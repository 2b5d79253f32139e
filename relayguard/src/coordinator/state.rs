//! Coordinator states and per-attempt outcomes.

use crate::classification::Classification;
use crate::core::StreamEvent;
use crate::errors::RelayError;
use crate::producer::EventStream;
use std::fmt;

/// State of one invocation.
///
/// `Attempting` is the only state that can loop back on itself; once
/// `FirstEventReady` is reached the producer is never invoked again.
pub enum CoordinatorState {
    /// Setup attempt `k` (1-indexed) is about to run.
    Attempting(usize),
    /// Setup succeeded; the first event is held back until yielded.
    FirstEventReady {
        /// The accepted first event.
        event: StreamEvent,
        /// The remainder of the same producer sequence.
        live: EventStream,
    },
    /// Relaying the remainder of the live sequence verbatim.
    Relaying {
        /// The live sequence.
        live: EventStream,
    },
    /// Setup gave up; the error is reported once.
    SetupFailed(RelayError),
    /// Terminal state.
    Done(Completion),
}

impl CoordinatorState {
    /// Short state name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Attempting(_) => "attempting",
            Self::FirstEventReady { .. } => "first_event_ready",
            Self::Relaying { .. } => "relaying",
            Self::SetupFailed(_) => "setup_failed",
            Self::Done(_) => "done",
        }
    }
}

impl fmt::Debug for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attempting(k) => f.debug_tuple("Attempting").field(k).finish(),
            Self::FirstEventReady { event, .. } => f
                .debug_struct("FirstEventReady")
                .field("event", event)
                .finish_non_exhaustive(),
            Self::Relaying { .. } => f.debug_struct("Relaying").finish_non_exhaustive(),
            Self::SetupFailed(err) => f.debug_tuple("SetupFailed").field(err).finish(),
            Self::Done(completion) => f.debug_tuple("Done").field(completion).finish(),
        }
    }
}

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The live sequence ran to completion.
    Success,
    /// The producer completed without yielding anything during setup.
    Empty,
    /// Exactly one synthesized error event was yielded.
    Failed,
}

impl Completion {
    /// Lowercase name for logs and span attributes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Empty => "empty",
            Self::Failed => "failed",
        }
    }
}

/// Result of one setup attempt. Internal to the coordinator loop.
pub(crate) enum AttemptOutcome {
    /// Setup succeeded.
    FirstEvent {
        /// The first event.
        event: StreamEvent,
        /// The remainder of the sequence.
        live: EventStream,
    },
    /// Setup failed.
    Failed {
        /// The failure message.
        message: String,
        /// How the failure was classified.
        classification: Classification,
    },
}
