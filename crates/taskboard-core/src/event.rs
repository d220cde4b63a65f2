//! Status changes and their reconciliation results.

use taskboard_models::{TaskId, TaskStatus};

/// A status change decided by a finished drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Item that was moved.
    pub task_id: TaskId,
    /// Status before the drag started.
    pub from: TaskStatus,
    /// Status at drop.
    pub to: TaskStatus,
}

impl StatusChange {
    /// Creates a new status change.
    pub fn new(task_id: impl Into<TaskId>, from: TaskStatus, to: TaskStatus) -> Self {
        Self {
            task_id: task_id.into(),
            from,
            to,
        }
    }

    /// Returns true if the item ends where it started.
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Result of reconciling one status change with the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Backend accepted the change; the speculative state stands.
    Committed,
    /// Nothing to persist (dropped back on the original column).
    Unchanged,
    /// Backend rejected the change; the board was rolled back.
    Failed(String),
    /// Backend rejected the change, but a newer commit for the same item had
    /// already started, so this result was discarded. Returned to the caller
    /// of `execute` but never published.
    Superseded,
}

impl CommitOutcome {
    /// Returns true unless the change was rejected.
    pub fn is_success(&self) -> bool {
        !matches!(self, CommitOutcome::Failed(_) | CommitOutcome::Superseded)
    }
}

/// Published once per reconciled commit that was not superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEvent {
    /// The change that was reconciled.
    pub change: StatusChange,
    /// How it ended.
    pub outcome: CommitOutcome,
}
