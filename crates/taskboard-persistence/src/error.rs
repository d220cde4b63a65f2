//! Error types for persistence operations.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the task backend.
///
/// Every variant means the same thing to the board core: the operation was
/// not applied.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The call did not finish within the configured bound.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The response body was not the expected JSON.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The client is missing required settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The backend refused the change.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl PersistenceError {
    /// Returns true if this error came from an elapsed timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            PersistenceError::Timeout(_) => true,
            PersistenceError::Request(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PersistenceError::Status {
            status: 409,
            body: "conflict".into(),
        };
        assert_eq!(err.to_string(), "backend returned 409: conflict");

        let err = PersistenceError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "timed out after 250ms");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PersistenceError = json_err.into();
        assert!(matches!(err, PersistenceError::Decode(_)));
        assert!(!err.is_timeout());
    }
}
