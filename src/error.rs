//! Typed errors for the places where callers branch on what went wrong.
//!
//! Everything else in the crate propagates `anyhow::Error` with context
//! attached at the I/O boundary.

use std::fmt;

/// Errors raised by a [`CompletionService`](crate::completion::CompletionService).
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The response body was not the JSON shape we expect.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Category of a failed batch, written as the first field of an error entry.
///
/// None of these abort a partition; the dispatcher records the entry and
/// moves on to the next batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BatchFailure {
    /// The completion service could not be reached or rejected the request.
    ServiceCallFailed,
    /// The service answered, but without usable text.
    EmptyResponse,
    /// The response lines could not be appended to the checkpoint file.
    PersistFailed,
}

impl BatchFailure {
    /// Stable category label used in error files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServiceCallFailed => "service call failed",
            Self::EmptyResponse => "empty or malformed response",
            Self::PersistFailed => "result parsing failed",
        }
    }
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
