//! Marker lists used by the classifiers.
//!
//! The three lists describe different failure populations and are kept
//! separate on purpose: stream setup cares about auth and content faults,
//! connection health about link-level faults, and schema validation adds
//! account-level limits on top of the stream list.

use regex::Regex;
use std::sync::LazyLock;

/// Lower-case substrings marking a permanent stream failure.
pub const TERMINAL_MARKERS: &[&str] = &[
    "authentication",
    "unauthenticated",
    "authorization",
    "unauthorized",
    "forbidden",
    "permission",
    "access denied",
    "access_denied",
    "invalid credential",
    "invalid api key",
    "invalid_api_key",
    "401",
    "404",
    "not found",
    "contract validation failed",
];

/// Matches "model <anything> does not exist".
pub static MISSING_MODEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)model\b.*\bdoes not exist").expect("static regex is valid")
});

/// Lower-case substrings marking a transient connection fault.
pub const TRANSIENT_CONNECTION_MARKERS: &[&str] = &[
    "econnreset",
    "connection reset",
    "econnrefused",
    "connection refused",
    "connection closed",
    "connection aborted",
    "socket hang up",
    "socket closed",
    "broken pipe",
    "epipe",
    "etimedout",
    "timed out",
    "timeout",
    "enotfound",
    "eai_again",
    "getaddrinfo",
    "dns",
    "network",
    "host unreachable",
];

/// Lower-case substrings that make a schema validation failure terminal.
pub const VALIDATION_TERMINAL_MARKERS: &[&str] = &[
    "quota",
    "insufficient_quota",
    "rate limit",
    "rate_limit",
    "ratelimit",
    "billing",
    "payment required",
    "402",
];

/// Returns true if the lower-cased text contains any of the markers.
pub(crate) fn contains_any(lowered: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| lowered.contains(marker))
}
