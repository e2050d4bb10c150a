//! Error classification for failover decisions
//!
//! Upstream LLM services expose no structured error codes to this layer, so
//! classification works on the textual content of the error message,
//! case-insensitively. This module is the single place that brittle string
//! matching lives; if an upstream service changes its error format, only the
//! marker lists below need updating.

use tower::BoxError;

/// How a failed attempt should be handled by the failover loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The credential was rejected (401/403/invalid key). The credential is
    /// permanently disqualified for this call; rotate to the next one.
    Auth,
    /// The upstream service is temporarily overloaded or unavailable. Retry
    /// the same credential after a backoff delay.
    Overloaded,
    /// Anything else. Assumed deterministic and not worth retrying; aborts
    /// the whole procedure.
    Fatal,
}

/// Message substrings that indicate a rejected credential.
const AUTH_MARKERS: &[&str] = &[
    "401",
    "403",
    "permission_denied",
    "permission denied",
    "unauthorized",
    "invalid api key",
    "api key not valid",
    "api_key_invalid",
];

/// Message substrings that indicate a transient overload.
const OVERLOAD_MARKERS: &[&str] = &[
    "503",
    "overloaded",
    "unavailable",
    "resource has been exhausted",
    "429",
];

/// Classify an error message into an [`ErrorKind`].
///
/// Pure function of the message text; auth markers win over overload markers
/// when both appear.
pub fn classify_message(message: &str) -> ErrorKind {
    let lowered = message.to_lowercase();
    if AUTH_MARKERS.iter().any(|m| lowered.contains(m)) {
        return ErrorKind::Auth;
    }
    if OVERLOAD_MARKERS.iter().any(|m| lowered.contains(m)) {
        return ErrorKind::Overloaded;
    }
    ErrorKind::Fatal
}

/// Classify a boxed error by its `Display` output.
pub fn classify(error: &BoxError) -> ErrorKind {
    classify_message(&error.to_string())
}
