//! Board and reconciler configuration.

use std::time::Duration;

use taskboard_models::ColumnSet;

/// How a rejected status change is undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollbackStrategy {
    /// Re-fetch the whole board from the backend and load it.
    #[default]
    Reload,
    /// Put only the rejected item back to its original status.
    PointRestore,
}

/// Configuration for the mutation reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Upper bound for each backend call made while reconciling.
    pub request_timeout: Duration,
    /// Rollback granularity on failure.
    pub rollback: RollbackStrategy,
    /// Capacity of the commit event channel.
    pub event_capacity: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            rollback: RollbackStrategy::Reload,
            event_capacity: 64,
        }
    }
}

impl ReconcilerConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the rollback strategy.
    pub fn with_rollback(mut self, rollback: RollbackStrategy) -> Self {
        self.rollback = rollback;
        self
    }

    /// Sets the commit event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

/// Configuration for a [`Board`](crate::Board).
#[derive(Debug, Clone, Default)]
pub struct BoardConfig {
    /// Columns rendered on the board, in order.
    pub columns: ColumnSet,
    /// Reconciler settings.
    pub reconciler: ReconcilerConfig,
}

impl BoardConfig {
    /// Creates a new config with the four default columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the columns.
    pub fn with_columns(mut self, columns: ColumnSet) -> Self {
        self.columns = columns;
        self
    }

    /// Sets the reconciler settings.
    pub fn with_reconciler(mut self, reconciler: ReconcilerConfig) -> Self {
        self.reconciler = reconciler;
        self
    }
}
