use std::time::Duration;
use thiserror::Error;

/// Classified failure of a call to the slide service.
///
/// Transports resolve to either a value or one of these; nothing else
/// escapes their boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No response within the client-side limit.
    #[error("request timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },

    /// The service answered with a structured `detail` message.
    #[error("{0}")]
    Remote(String),

    /// The response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Protocol(String),

    /// Connection-level failure, or an error status without a usable detail.
    #[error("network error: {0}")]
    Network(String),
}

impl TransportError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            TransportError::Timeout { after: timeout }
        } else if err.is_decode() {
            TransportError::Protocol(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
