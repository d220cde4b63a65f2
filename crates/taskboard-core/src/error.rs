//! Error types for board operations.

use taskboard_models::{TaskId, TaskStatus};
use taskboard_persistence::PersistenceError;
use thiserror::Error;

/// Errors that can occur while mutating the board.
#[derive(Error, Debug)]
pub enum BoardError {
    /// Status is not one of the board's configured columns.
    #[error("invalid status: {status} is not a configured column")]
    InvalidStatus {
        /// The rejected status.
        status: TaskStatus,
    },

    /// No item with this id is on the board.
    #[error("work item not found: {0}")]
    ItemNotFound(TaskId),

    /// Backend call failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Lock poisoned (thread panicked while holding lock).
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result type alias for board operations.
pub type Result<T> = std::result::Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BoardError::InvalidStatus {
            status: TaskStatus::Review,
        };
        assert_eq!(
            err.to_string(),
            "invalid status: review is not a configured column"
        );

        let err = BoardError::ItemNotFound(TaskId::from("t1"));
        assert_eq!(err.to_string(), "work item not found: t1");
    }

    #[test]
    fn test_error_from_persistence() {
        let err: BoardError = PersistenceError::Rejected("nope".into()).into();
        assert!(matches!(err, BoardError::Persistence(_)));
    }
}
