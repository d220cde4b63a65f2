//! DragController - turns a pointer gesture into speculative status moves.
//!
//! The controller is a two-state machine:
//!
//! ```text
//!            begin(id)                 end(target)
//!   Idle ─────────────────▶ Dragging ─────────────────▶ Idle
//!                            │    ▲
//!                  hover(t)  └────┘
//! ```
//!
//! While dragging, every hover that resolves to a different column moves the
//! card in the store at once, so the board follows the pointer. Nothing here
//! touches the network; a finished drag yields a [`StatusChange`] for the
//! reconciler.
//!
//! A hover target is either a column id (`"in_progress"`) or the id of another
//! card, in which case the target column is that card's current status.

use taskboard_models::{TaskId, TaskStatus};
use tracing::{debug, error, trace, warn};

use crate::error::BoardError;
use crate::event::StatusChange;
use crate::store::{BoardSnapshot, BoardStore};

/// State of an in-progress drag.
#[derive(Debug, Clone)]
pub struct DragSession {
    active: TaskId,
    original_status: TaskStatus,
    snapshot: BoardSnapshot,
    last_target: Option<String>,
}

impl DragSession {
    /// The card being dragged.
    pub fn active(&self) -> &TaskId {
        &self.active
    }

    /// The card's status when the drag began.
    pub fn original_status(&self) -> TaskStatus {
        self.original_status
    }

    /// Board state when the drag began.
    pub fn snapshot(&self) -> &BoardSnapshot {
        &self.snapshot
    }

    /// The most recent hover target, resolved or not.
    pub fn last_target(&self) -> Option<&str> {
        self.last_target.as_deref()
    }
}

#[derive(Debug, Default)]
enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// What applying a speculative move did to the session.
enum Applied {
    Ok,
    Abort,
}

/// Drag state machine over a [`BoardStore`].
pub struct DragController {
    store: BoardStore,
    state: DragState,
}

impl DragController {
    /// Creates an idle controller.
    pub fn new(store: BoardStore) -> Self {
        Self {
            store,
            state: DragState::Idle,
        }
    }

    /// Returns true while a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// The current session, if dragging.
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    /// Starts dragging a card.
    ///
    /// Returns false and stays idle if the card is not on the board. A drag
    /// that is already running is abandoned first, as if cancelled.
    pub fn begin(&mut self, id: &TaskId) -> bool {
        if let DragState::Dragging(previous) = std::mem::take(&mut self.state) {
            debug!(task_id = %previous.active, "abandoning unfinished drag");
            self.restore(&previous);
        }

        let snapshot = self.store.snapshot();
        let Some(original_status) = snapshot.status_of(id) else {
            debug!(task_id = %id, "drag started on unknown item, ignoring");
            return false;
        };

        trace!(task_id = %id, status = %original_status, "drag started");
        self.state = DragState::Dragging(DragSession {
            active: id.clone(),
            original_status,
            snapshot,
            last_target: None,
        });
        true
    }

    /// Moves the card speculatively to the column `target` resolves to.
    ///
    /// Ignored while idle and for targets that resolve to no column.
    pub fn hover(&mut self, target: &str) {
        let DragState::Dragging(session) = &mut self.state else {
            trace!(target, "hover while idle, ignoring");
            return;
        };
        session.last_target = Some(target.to_string());
        let active = session.active.clone();

        let Some(column) = self.resolve_target(target) else {
            trace!(target, "hover target resolves to no column");
            return;
        };

        match self.store.status_of(&active) {
            Some(current) if current == column => {}
            Some(_) => {
                if let Applied::Abort = self.apply(&active, column) {
                    self.state = DragState::Idle;
                }
            }
            None => {
                debug!(task_id = %active, "dragged item disappeared, aborting drag");
                self.state = DragState::Idle;
            }
        }
    }

    /// Finishes the drag.
    ///
    /// With no target, or a target that resolves to no column, the board is
    /// restored to the drag's snapshot and `None` is returned. Otherwise the
    /// final column is applied once more and the resulting change is handed
    /// back for reconciliation. The change may be a no-op (`from == to`).
    pub fn end(&mut self, target: Option<&str>) -> Option<StatusChange> {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            trace!("drag end while idle, ignoring");
            return None;
        };

        let Some(column) = target.and_then(|t| self.resolve_target(t)) else {
            debug!(task_id = %session.active, ?target, "drag cancelled");
            self.restore(&session);
            return None;
        };

        match self.apply(&session.active, column) {
            Applied::Ok => {
                trace!(task_id = %session.active, from = %session.original_status, to = %column, "drag finished");
                Some(StatusChange {
                    task_id: session.active,
                    from: session.original_status,
                    to: column,
                })
            }
            Applied::Abort => None,
        }
    }

    /// Cancels the drag, restoring the board. Same as `end(None)`.
    pub fn cancel(&mut self) {
        let _ = self.end(None);
    }

    fn resolve_target(&self, target: &str) -> Option<TaskStatus> {
        self.store
            .column_set()
            .resolve(target)
            .or_else(|| self.store.status_of(&TaskId::from(target)))
    }

    fn apply(&self, id: &TaskId, column: TaskStatus) -> Applied {
        match self.store.set_status(id, column) {
            Ok(_) => Applied::Ok,
            Err(BoardError::ItemNotFound(_)) => {
                // Deleted elsewhere; the next refresh reconciles.
                debug!(task_id = %id, "dragged item no longer on the board");
                Applied::Abort
            }
            Err(BoardError::InvalidStatus { status }) => {
                error!(task_id = %id, %status, "drag resolved to an unconfigured column");
                if cfg!(debug_assertions) {
                    panic!("drag resolved to unconfigured column {status}");
                }
                Applied::Abort
            }
            Err(e) => {
                warn!(task_id = %id, error = %e, "speculative move failed");
                Applied::Abort
            }
        }
    }

    fn restore(&self, session: &DragSession) {
        if let Err(e) = self.store.restore(&session.snapshot) {
            warn!(task_id = %session.active, error = %e, "failed to restore drag snapshot");
        }
    }
}
