//! Optimistic drag-and-drop status reconciliation for the task board.
//!
//! This crate keeps the board responsive while status changes travel to the
//! backend:
//! - [`BoardStore`] - the single in-memory copy of the project's tasks
//! - [`DragController`] - moves a card live while it is dragged, and snapshots
//!   the board so a cancelled drag restores it exactly
//! - [`MutationReconciler`] - persists a dropped card, rolls back on failure,
//!   and ignores failures of commits a newer drag already superseded
//! - [`Board`] - wires the three together behind UI-facing drag hooks
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskboard_core::{Board, BoardConfig, TaskFilter};
//! use taskboard_models::{TaskId, TaskPriority};
//! use taskboard_persistence::MemoryBackend;
//!
//! # async fn run() -> taskboard_core::Result<()> {
//! let mut board = Board::new("proj-1", Arc::new(MemoryBackend::new()), BoardConfig::default());
//! board.refresh().await?;
//!
//! board.on_drag_begin(&TaskId::from("t1"));
//! board.on_drag_hover("review");
//! let pending = board.on_drag_end(Some("review"));
//!
//! let urgent = TaskFilter::new().with_min_priority(TaskPriority::High);
//! for column in board.columns(Some(&urgent)) {
//!     println!("{}: {} cards", column.column.label, column.items.len());
//! }
//! # drop(pending);
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod config;
pub mod drag;
pub mod error;
pub mod event;
pub mod filter;
pub mod reconciler;
pub mod store;

pub use board::Board;
pub use config::{BoardConfig, ReconcilerConfig, RollbackStrategy};
pub use drag::{DragController, DragSession};
pub use error::{BoardError, Result};
pub use event::{CommitEvent, CommitOutcome, StatusChange};
pub use filter::TaskFilter;
pub use reconciler::{CommitLog, CommitTicket, MutationReconciler};
pub use store::{BoardSnapshot, BoardStore, ColumnView};
