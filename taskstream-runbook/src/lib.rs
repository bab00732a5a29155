//! Runbook task-management domain built on the `taskstream` engine.
//!
//! A runbook is an aggregate owning a set of tasks. Its durable state is
//! its event stream; the queryable side is materialized by two
//! projections: a runbook list (existence read model) and a task list per
//! runbook.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod commands;
pub mod events;
pub mod read_model;
pub mod types;

pub use aggregate::Runbook;
pub use commands::RunbookCommand;
pub use events::RunbookEvent;
pub use read_model::{
    RunbookEntity, RunbookListProjection, RunbookStore, RunbookTasksProjection, TaskEntity,
    TaskStore,
};
pub use types::{runbook_stream, ProjectId, RunbookId, TaskId, TaskStatus, UserId};
