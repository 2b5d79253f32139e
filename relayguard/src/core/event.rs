//! Stream event value type.

use super::EventKind;
use serde::{Deserialize, Serialize};

/// One unit of streamed producer output.
///
/// Events are plain values: ownership moves to the consumer on yield and the
/// producer keeps no reference to them afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// The event kind.
    pub kind: EventKind,

    /// Optional text payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool name, only meaningful for `tool-call` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Correlation id, expected on `terminal-result` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl StreamEvent {
    /// Creates an event of the given kind with no payload.
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            content: None,
            tool_name: None,
            correlation_id: None,
        }
    }

    /// Creates a `data` event.
    #[must_use]
    pub fn data(content: impl Into<String>) -> Self {
        Self::new(EventKind::Data).with_content(content)
    }

    /// Creates a `tool-call` event.
    #[must_use]
    pub fn tool_call(tool_name: impl Into<String>, content: Option<String>) -> Self {
        Self {
            content,
            tool_name: Some(tool_name.into()),
            ..Self::new(EventKind::ToolCall)
        }
    }

    /// Creates a `system-note` event.
    #[must_use]
    pub fn system_note(content: impl Into<String>) -> Self {
        Self::new(EventKind::SystemNote).with_content(content)
    }

    /// Creates a `thinking` event.
    #[must_use]
    pub fn thinking(content: impl Into<String>) -> Self {
        Self::new(EventKind::Thinking).with_content(content)
    }

    /// Creates a `terminal-result` event carrying a correlation id.
    #[must_use]
    pub fn terminal_result(correlation_id: impl Into<String>) -> Self {
        Self::new(EventKind::TerminalResult).with_correlation_id(correlation_id)
    }

    /// Creates an `error` event.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventKind::Error).with_content(message)
    }

    /// Sets the content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Returns true for `error` events.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == EventKind::Error
    }

    /// Returns the content, or an empty string when absent.
    #[must_use]
    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}
