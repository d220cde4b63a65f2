//! Task persistence collaborator for the board.
//!
//! The board core only needs two remote operations: persist a status change
//! and list the authoritative tasks of a project. This crate defines that seam
//! as the [`TaskBackend`] trait and ships two implementations:
//! - [`RestBackend`] - HTTP+JSON client for a PostgREST-style hosted store
//! - [`MemoryBackend`] - in-process rows for development and tests
//!
//! # Example
//!
//! ```no_run
//! use taskboard_persistence::{RestBackend, TaskBackend};
//! use taskboard_models::{ProjectId, TaskId, TaskStatus};
//!
//! # async fn run() -> taskboard_persistence::Result<()> {
//! let backend = RestBackend::from_env()?;
//! backend
//!     .update_task_status(&TaskId::from("t1"), TaskStatus::Review)
//!     .await?;
//! let tasks = backend.list_tasks(&ProjectId::from("p1")).await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod memory;
pub mod rest;

pub use backend::TaskBackend;
pub use config::BackendConfig;
pub use error::{PersistenceError, Result};
pub use memory::MemoryBackend;
pub use rest::RestBackend;
