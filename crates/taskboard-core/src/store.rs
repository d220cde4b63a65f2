//! BoardStore - the working copy of a board's work items.
//!
//! The store is the single source of truth the UI renders from. Every item in
//! it has a status that is one of the board's configured columns; `load` drops
//! rows that would break this and `set_status` refuses to create them.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use taskboard_models::{Column, ColumnSet, TaskId, TaskStatus, WorkItem};
use tracing::{trace, warn};

use crate::error::{BoardError, Result};
use crate::filter::TaskFilter;

/// Immutable copy of the store's items, taken for later restoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    items: Arc<[WorkItem]>,
}

impl BoardSnapshot {
    /// Items in store order.
    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    /// Looks up an item by id.
    pub fn get(&self, id: &TaskId) -> Option<&WorkItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    /// Status an item had when the snapshot was taken.
    pub fn status_of(&self, id: &TaskId) -> Option<TaskStatus> {
        self.get(id).map(|item| item.status)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the snapshot holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One rendered column and the cards in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnView {
    /// The column.
    pub column: Column,
    /// Cards whose status equals the column id, in store order.
    pub items: Vec<WorkItem>,
}

struct StoreState {
    items: Vec<WorkItem>,
    revision: u64,
}

/// Shared handle to a board's working set.
///
/// Cloning the handle is cheap; all clones see the same items. Locks are held
/// only for the duration of a single call, never across an await.
#[derive(Clone)]
pub struct BoardStore {
    columns: Arc<ColumnSet>,
    state: Arc<RwLock<StoreState>>,
}

impl BoardStore {
    /// Creates an empty store for the given columns.
    pub fn new(columns: ColumnSet) -> Self {
        Self {
            columns: Arc::new(columns),
            state: Arc::new(RwLock::new(StoreState {
                items: Vec::new(),
                revision: 0,
            })),
        }
    }

    /// The board's configured columns.
    pub fn column_set(&self) -> &ColumnSet {
        &self.columns
    }

    /// Replaces the entire working set.
    ///
    /// Rows with an unconfigured status or a repeated id are dropped.
    pub fn load(&self, items: Vec<WorkItem>) -> Result<()> {
        self.replace(items, &HashMap::new())
    }

    /// Replaces the working set, then forces the given statuses onto the
    /// matching items in the same step.
    pub(crate) fn replace(
        &self,
        items: Vec<WorkItem>,
        overrides: &HashMap<TaskId, TaskStatus>,
    ) -> Result<()> {
        let mut seen = HashSet::new();
        let mut accepted = Vec::with_capacity(items.len());

        for mut item in items {
            if let Some(status) = overrides.get(&item.id) {
                item.status = *status;
            }
            if !self.columns.contains(item.status) {
                warn!(task_id = %item.id, status = %item.status, "dropping item outside configured columns");
                continue;
            }
            if !seen.insert(item.id.clone()) {
                warn!(task_id = %item.id, "dropping duplicate item");
                continue;
            }
            accepted.push(item);
        }

        let mut state = self
            .state
            .write()
            .map_err(|e| BoardError::LockPoisoned(e.to_string()))?;
        state.items = accepted;
        state.revision += 1;

        trace!(count = state.items.len(), revision = state.revision, "board loaded");
        Ok(())
    }

    /// Sets one item's status in place.
    ///
    /// Returns the previous status. Fails without mutating anything if the
    /// status is not a configured column or the item is not on the board.
    pub fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<TaskStatus> {
        if !self.columns.contains(status) {
            return Err(BoardError::InvalidStatus { status });
        }

        let mut state = self
            .state
            .write()
            .map_err(|e| BoardError::LockPoisoned(e.to_string()))?;

        let item = state
            .items
            .iter_mut()
            .find(|item| item.id == *id)
            .ok_or_else(|| BoardError::ItemNotFound(id.clone()))?;

        let previous = item.status;
        if previous != status {
            item.status = status;
            state.revision += 1;
            trace!(task_id = %id, from = %previous, to = %status, "status set");
        }

        Ok(previous)
    }

    /// Takes an immutable copy of the current items.
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            items: self.items().into(),
        }
    }

    /// Restores a snapshot. Equivalent to `load`.
    pub fn restore(&self, snapshot: &BoardSnapshot) -> Result<()> {
        self.load(snapshot.items().to_vec())
    }

    /// Gets an item by id.
    pub fn get(&self, id: &TaskId) -> Option<WorkItem> {
        let state = self.state.read().ok()?;
        state.items.iter().find(|item| item.id == *id).cloned()
    }

    /// Current status of an item.
    pub fn status_of(&self, id: &TaskId) -> Option<TaskStatus> {
        let state = self.state.read().ok()?;
        state
            .items
            .iter()
            .find(|item| item.id == *id)
            .map(|item| item.status)
    }

    /// All items in store order.
    pub fn items(&self) -> Vec<WorkItem> {
        self.state
            .read()
            .map(|s| s.items.clone())
            .unwrap_or_default()
    }

    /// Number of items on the board.
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.items.len()).unwrap_or(0)
    }

    /// Returns true if the board has no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counter bumped on every visible change; views re-render when it moves.
    pub fn revision(&self) -> u64 {
        self.state.read().map(|s| s.revision).unwrap_or(0)
    }

    /// Partitions the items into the configured columns.
    ///
    /// Every configured column is returned, in board order, even when empty.
    pub fn columns(&self, filter: Option<&TaskFilter>) -> Vec<ColumnView> {
        let items = self.items();

        self.columns
            .iter()
            .map(|column| ColumnView {
                column: column.clone(),
                items: items
                    .iter()
                    .filter(|item| item.status == column.id)
                    .filter(|item| filter.map(|f| f.matches(item)).unwrap_or(true))
                    .cloned()
                    .collect(),
            })
            .collect()
    }
}
