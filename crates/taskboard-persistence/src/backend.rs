//! TaskBackend trait definition.
//!
//! The board core never talks to a concrete store. It is handed an
//! `Arc<dyn TaskBackend>` at construction, which lets tests swap in doubles.

use async_trait::async_trait;
use std::sync::Arc;

use taskboard_models::{ProjectId, TaskId, TaskStatus, WorkItem};

use crate::error::Result;

/// Task persistence collaborator.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Persist a new status for one task.
    ///
    /// Idempotent. Any error means the change was not applied.
    async fn update_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<()>;

    /// Fetch the full, authoritative set of tasks for a project.
    async fn list_tasks(&self, project_id: &ProjectId) -> Result<Vec<WorkItem>>;
}

#[async_trait]
impl<T: TaskBackend + ?Sized> TaskBackend for Arc<T> {
    async fn update_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<()> {
        (**self).update_task_status(id, status).await
    }

    async fn list_tasks(&self, project_id: &ProjectId) -> Result<Vec<WorkItem>> {
        (**self).list_tasks(project_id).await
    }
}
