//! In-process task backend for development and testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use taskboard_models::{ProjectId, TaskId, TaskStatus, WorkItem};

use crate::backend::TaskBackend;
use crate::error::{PersistenceError, Result};

/// Task backend that keeps rows in memory.
///
/// Updates can be switched to fail, which makes it usable for exercising
/// rollback paths without a network.
#[derive(Default)]
pub struct MemoryBackend {
    rows: RwLock<Vec<WorkItem>>,
    reject_updates: AtomicBool,
    update_calls: AtomicUsize,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-populated with rows.
    pub fn with_items(items: Vec<WorkItem>) -> Self {
        Self {
            rows: RwLock::new(items),
            ..Self::default()
        }
    }

    /// Replaces all rows.
    pub async fn seed(&self, items: Vec<WorkItem>) {
        *self.rows.write().await = items;
    }

    /// Returns a copy of all rows.
    pub async fn items(&self) -> Vec<WorkItem> {
        self.rows.read().await.clone()
    }

    /// Makes every subsequent status update fail (or succeed again).
    pub fn set_reject_updates(&self, reject: bool) {
        self.reject_updates.store(reject, Ordering::SeqCst);
    }

    /// Number of status updates attempted so far.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskBackend for MemoryBackend {
    async fn update_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        if self.reject_updates.load(Ordering::SeqCst) {
            return Err(PersistenceError::Rejected(format!(
                "updates disabled, {} not moved to {}",
                id, status
            )));
        }

        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|row| row.id == *id)
            .ok_or_else(|| PersistenceError::Rejected(format!("no task with id {}", id)))?;
        row.status = status;

        debug!(task_id = %id, %status, "stored status");
        Ok(())
    }

    async fn list_tasks(&self, project_id: &ProjectId) -> Result<Vec<WorkItem>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|row| row.project_id == *project_id)
            .cloned()
            .collect())
    }
}
