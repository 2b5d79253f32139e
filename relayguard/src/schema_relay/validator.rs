//! Payload validation collaborator.

/// Decides whether a complete payload is acceptable.
///
/// The error text is classified to decide whether the whole invocation is
/// worth repeating.
#[cfg_attr(test, mockall::automock)]
pub trait PayloadValidator: Send + Sync {
    /// Validates the concatenated `data` content of one full pass.
    fn validate(&self, payload: &str) -> Result<(), String>;
}

impl<F> PayloadValidator for F
where
    F: Fn(&str) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, payload: &str) -> Result<(), String> {
        self(payload)
    }
}

/// Accepts payloads that parse as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPayloadValidator;

impl PayloadValidator for JsonPayloadValidator {
    fn validate(&self, payload: &str) -> Result<(), String> {
        serde_json::from_str::<serde_json::Value>(payload)
            .map(|_| ())
            .map_err(|e| format!("payload is not valid JSON: {e}"))
    }
}
