//! Board - the entry points the UI layer wires its drag events to.

use std::sync::Arc;

use taskboard_models::{ProjectId, TaskId};
use taskboard_persistence::TaskBackend;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::BoardConfig;
use crate::drag::DragController;
use crate::error::Result;
use crate::event::{CommitEvent, CommitOutcome};
use crate::filter::TaskFilter;
use crate::reconciler::MutationReconciler;
use crate::store::{BoardStore, ColumnView};

/// One project's task board.
///
/// Drag hooks are synchronous and only touch memory. A finished drag is
/// persisted on a spawned task, so `on_drag_end` must be called from within a
/// tokio runtime.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_core::{Board, BoardConfig};
/// use taskboard_models::TaskId;
/// use taskboard_persistence::RestBackend;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = Arc::new(RestBackend::from_env()?);
/// let mut board = Board::new("proj-1", backend, BoardConfig::default());
/// board.refresh().await?;
///
/// let mut results = board.subscribe();
/// board.on_drag_begin(&TaskId::from("t1"));
/// board.on_drag_hover("in_progress");
/// if let Some(pending) = board.on_drag_end(Some("in_progress")) {
///     pending.await?;
/// }
/// let event = results.recv().await?;
/// println!("{} -> {:?}", event.change.task_id, event.outcome);
/// # Ok(())
/// # }
/// ```
pub struct Board {
    project_id: ProjectId,
    store: BoardStore,
    drag: DragController,
    reconciler: Arc<MutationReconciler>,
}

impl Board {
    /// Creates an empty board. Call [`refresh`](Self::refresh) to populate it.
    pub fn new(
        project_id: impl Into<ProjectId>,
        backend: Arc<dyn TaskBackend>,
        config: BoardConfig,
    ) -> Self {
        let project_id = project_id.into();
        let store = BoardStore::new(config.columns);
        let reconciler = MutationReconciler::new(
            store.clone(),
            backend,
            project_id.clone(),
            config.reconciler,
        );

        Self {
            project_id,
            drag: DragController::new(store.clone()),
            store,
            reconciler: Arc::new(reconciler),
        }
    }

    /// The project this board shows.
    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Fetches the project's tasks and loads them.
    ///
    /// Cards with a commit still in flight keep their speculative column;
    /// the commit's own answer decides where they end up.
    pub async fn refresh(&self) -> Result<usize> {
        let (items, pending) = self.reconciler.fetch_canonical().await?;
        self.store.replace(items, &pending)?;

        let count = self.store.len();
        info!(project_id = %self.project_id, count, pending = pending.len(), "board refreshed");
        Ok(count)
    }

    /// Pointer went down on a card.
    pub fn on_drag_begin(&mut self, id: &TaskId) -> bool {
        self.drag.begin(id)
    }

    /// Pointer moved over a column or a card.
    pub fn on_drag_hover(&mut self, target: &str) {
        self.drag.hover(target);
    }

    /// Pointer released over `target`, or the drag was cancelled (`None`).
    ///
    /// Returns a handle to the spawned commit when there is something to
    /// persist. The commit is registered before this returns, so a drag that
    /// starts afterwards always supersedes it.
    pub fn on_drag_end(&mut self, target: Option<&str>) -> Option<JoinHandle<CommitOutcome>> {
        let change = self.drag.end(target)?;
        let ticket = self.reconciler.prepare(change)?;

        debug!(task_id = %ticket.change().task_id, seq = ticket.seq(), "spawning commit");
        let reconciler = Arc::clone(&self.reconciler);
        Some(tokio::spawn(async move { reconciler.execute(ticket).await }))
    }

    /// Returns true while a card is being dragged.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Subscribes to commit results (the error toast feed).
    pub fn subscribe(&self) -> broadcast::Receiver<CommitEvent> {
        self.reconciler.subscribe()
    }

    /// The board's store.
    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    /// Columns to render.
    pub fn columns(&self, filter: Option<&TaskFilter>) -> Vec<ColumnView> {
        self.store.columns(filter)
    }

    /// Commits still waiting on the backend.
    pub fn pending_commits(&self) -> usize {
        self.reconciler.in_flight()
    }
}
