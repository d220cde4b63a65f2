//! Board columns.
//!
//! Columns are a constant projection of [`TaskStatus`]; they are not persisted
//! per board.

use serde::{Deserialize, Serialize};

use crate::task::TaskStatus;

/// A single pipeline stage as rendered on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column identifier (the status it collects).
    pub id: TaskStatus,
    /// Heading shown above the column.
    pub label: String,
}

impl Column {
    /// Creates a column with the status' default label.
    pub fn new(id: TaskStatus) -> Self {
        Self {
            id,
            label: id.label().to_string(),
        }
    }

    /// Overrides the heading.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// The ordered set of columns configured for a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    columns: Vec<Column>,
}

impl ColumnSet {
    /// Builds a column set from statuses, keeping first-occurrence order.
    pub fn new(statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        Self::from_columns(statuses.into_iter().map(Column::new))
    }

    /// Builds a column set from pre-labelled columns. Duplicate ids are dropped.
    pub fn from_columns(columns: impl IntoIterator<Item = Column>) -> Self {
        let mut out: Vec<Column> = Vec::new();
        for column in columns {
            if !out.iter().any(|c| c.id == column.id) {
                out.push(column);
            }
        }
        Self { columns: out }
    }

    /// Returns true if `status` is one of the configured columns.
    pub fn contains(&self, status: TaskStatus) -> bool {
        self.columns.iter().any(|c| c.id == status)
    }

    /// Resolves a column identifier such as `"in_progress"`.
    ///
    /// Returns `None` for unknown identifiers and for statuses that exist but
    /// are not configured on this board.
    pub fn resolve(&self, id: &str) -> Option<TaskStatus> {
        id.parse::<TaskStatus>()
            .ok()
            .filter(|status| self.contains(*status))
    }

    /// Looks up the column for a status.
    pub fn get(&self, status: TaskStatus) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == status)
    }

    /// Iterates the columns in board order.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Number of configured columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if no columns are configured.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self::new(TaskStatus::ALL)
    }
}
