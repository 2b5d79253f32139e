//! Event kind vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a streamed event.
///
/// Producers may hand over kinds they read off the wire verbatim, so a kind
/// outside the known vocabulary is representable as [`EventKind::Unknown`].
/// The contract validator rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// Partial output.
    Data,
    /// A tool-use notice.
    ToolCall,
    /// Out-of-band informational note from the producer.
    SystemNote,
    /// Reasoning output.
    Thinking,
    /// Final event carrying the correlation id.
    TerminalResult,
    /// An in-band failure.
    Error,
    /// Any kind outside the vocabulary above.
    Unknown(String),
}

impl EventKind {
    /// The kinds a producer is allowed to emit.
    pub const KNOWN: [Self; 6] = [
        Self::Data,
        Self::ToolCall,
        Self::SystemNote,
        Self::Thinking,
        Self::TerminalResult,
        Self::Error,
    ];

    /// Parses a wire name into a kind. Never fails.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "data" => Self::Data,
            "tool-call" => Self::ToolCall,
            "system-note" => Self::SystemNote,
            "thinking" => Self::Thinking,
            "terminal-result" => Self::TerminalResult,
            "error" => Self::Error,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns the wire name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Data => "data",
            Self::ToolCall => "tool-call",
            Self::SystemNote => "system-note",
            Self::Thinking => "thinking",
            Self::TerminalResult => "terminal-result",
            Self::Error => "error",
            Self::Unknown(name) => name,
        }
    }

    /// Returns true if the kind belongs to the known vocabulary.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<EventKind> for String {
    fn from(value: EventKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
