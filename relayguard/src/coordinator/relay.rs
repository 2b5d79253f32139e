//! Relay phase: forward verbatim, report the first failure.

use futures::StreamExt;
use tracing::warn;

use super::{Invocation, EMPTY_ERROR_MESSAGE};
use crate::core::StreamEvent;
use crate::errors::RelayError;
use crate::producer::EventStream;

impl Invocation {
    /// Pulls the next relayed event.
    ///
    /// `None` is natural completion. `Some(Err(_))` ends the relay; the
    /// error is reported, never retried.
    pub(super) async fn pull_relayed(
        &self,
        live: &mut EventStream,
    ) -> Option<Result<StreamEvent, RelayError>> {
        let item = live.next().await?;
        Some(self.check_relayed(item.map_err(|err| err.message)))
    }

    fn check_relayed(&self, item: Result<StreamEvent, String>) -> Result<StreamEvent, RelayError> {
        let event = item.map_err(|message| self.relay_failed(message))?;

        self.validator
            .validate(&event)
            .map_err(|violation| self.relay_failed(violation.to_string()))?;

        if event.is_error() {
            let message = match event.content_str() {
                "" => EMPTY_ERROR_MESSAGE,
                content => content,
            };
            return Err(self.relay_failed(message.to_string()));
        }

        Ok(event)
    }

    fn relay_failed(&self, message: String) -> RelayError {
        warn!(error = %message, "Relay failed after first event");
        RelayError::RelayFailed {
            producer: self.producer_name.clone(),
            message,
        }
    }
}
