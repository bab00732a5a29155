//! Commands the runbook aggregate handles.
//!
//! Commands are intent, not fact: handling one either produces events or a
//! typed rejection. Every command names its target runbook so the
//! aggregate can reject commands addressed to a different identity.

use crate::types::{ProjectId, RunbookId, TaskId, UserId};

/// The commands accepted by the [`Runbook`](crate::Runbook) aggregate.
#[derive(Debug, Clone)]
pub enum RunbookCommand {
    /// Create a new runbook.
    Create {
        /// Identity for the new runbook.
        runbook_id: RunbookId,
        /// The project the runbook belongs to.
        project_id: ProjectId,
        /// Human-readable runbook name.
        name: String,
        /// The owning user.
        owner_id: UserId,
    },
    /// Add a task to the runbook.
    AddTask {
        /// Target runbook.
        runbook_id: RunbookId,
        /// Identity for the new task.
        task_id: TaskId,
        /// The user the task is assigned to.
        assignee_id: UserId,
        /// Human-readable task name.
        name: String,
        /// Free-form task description.
        description: String,
    },
    /// Start a pending task.
    StartTask {
        /// Target runbook.
        runbook_id: RunbookId,
        /// The task to start.
        task_id: TaskId,
    },
    /// Complete an in-progress task.
    CompleteTask {
        /// Target runbook.
        runbook_id: RunbookId,
        /// The task to complete.
        task_id: TaskId,
        /// The user completing the task; must be the assignee.
        user_id: UserId,
    },
    /// Complete the runbook.
    Complete {
        /// Target runbook.
        runbook_id: RunbookId,
        /// The user completing the runbook; must be the owner.
        user_id: UserId,
    },
}

impl RunbookCommand {
    /// The runbook this command targets.
    pub const fn runbook_id(&self) -> &RunbookId {
        match self {
            Self::Create { runbook_id, .. }
            | Self::AddTask { runbook_id, .. }
            | Self::StartTask { runbook_id, .. }
            | Self::CompleteTask { runbook_id, .. }
            | Self::Complete { runbook_id, .. } => runbook_id,
        }
    }
}
