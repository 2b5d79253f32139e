//! Contract validation for streamed events.

use crate::core::{EventKind, StreamEvent};
use crate::errors::ContractViolation;

/// Validates events against the producer contract.
///
/// The rules are fixed: the kind must belong to the known vocabulary, and a
/// `terminal-result` must carry a non-empty correlation id. A disabled
/// validator accepts everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractValidator {
    enabled: bool,
}

impl Default for ContractValidator {
    fn default() -> Self {
        Self::enabled()
    }
}

impl ContractValidator {
    /// Creates a validator that enforces the contract.
    #[must_use]
    pub const fn enabled() -> Self {
        Self { enabled: true }
    }

    /// Creates a validator that accepts every event.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Creates a validator from a flag.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Returns whether validation is enforced.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Validates one event.
    pub fn validate(&self, event: &StreamEvent) -> Result<(), ContractViolation> {
        if !self.enabled {
            return Ok(());
        }
        validate_event(event)
    }
}

/// Validates one event against the contract rules.
pub fn validate_event(event: &StreamEvent) -> Result<(), ContractViolation> {
    match &event.kind {
        EventKind::Unknown(kind) => Err(ContractViolation::UnknownKind { kind: kind.clone() }),
        EventKind::TerminalResult => match event.correlation_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(()),
            _ => Err(ContractViolation::MissingCorrelationId),
        },
        _ => Ok(()),
    }
}
