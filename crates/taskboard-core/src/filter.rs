//! Work item filtering for board views.

use chrono::NaiveDate;
use taskboard_models::{TaskPriority, UserId, WorkItem};

/// Filter criteria for the cards shown on the board.
///
/// Filtering hides cards; it never moves a card to another column.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Only cards assigned to this user.
    pub assignee: Option<UserId>,
    /// Only cards at or above this priority.
    pub min_priority: Option<TaskPriority>,
    /// Only cards overdue as of this date.
    pub overdue_on: Option<NaiveDate>,
    /// Case-insensitive text in the title or description.
    pub search: Option<String>,
}

impl TaskFilter {
    /// Creates a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the assignee filter.
    pub fn with_assignee(mut self, assignee: impl Into<UserId>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Sets the minimum priority.
    pub fn with_min_priority(mut self, priority: TaskPriority) -> Self {
        self.min_priority = Some(priority);
        self
    }

    /// Keeps only cards overdue on `today`.
    pub fn overdue_on(mut self, today: NaiveDate) -> Self {
        self.overdue_on = Some(today);
        self
    }

    /// Sets the search text.
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into().to_lowercase());
        self
    }

    /// Returns true if the work item matches this filter.
    pub fn matches(&self, item: &WorkItem) -> bool {
        if let Some(ref assignee) = self.assignee {
            if item.assignee.as_ref() != Some(assignee) {
                return false;
            }
        }

        if let Some(min) = self.min_priority {
            if item.priority < min {
                return false;
            }
        }

        if let Some(today) = self.overdue_on {
            if !item.is_overdue(today) {
                return false;
            }
        }

        if let Some(ref needle) = self.search {
            let in_title = item.title.to_lowercase().contains(needle.as_str());
            let in_description = item
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle.as_str()));
            if !in_title && !in_description {
                return false;
            }
        }

        true
    }
}
