//! Core data models for the task board.
//!
//! This crate provides the types shared by the board core and its
//! persistence collaborator: typed ids, work items, and board columns.

pub mod column;
pub mod ids;
pub mod task;

pub use column::{Column, ColumnSet};
pub use ids::{ProjectId, TaskId, UserId};
pub use task::{ParseStatusError, TaskPriority, TaskStatus, WorkItem};
