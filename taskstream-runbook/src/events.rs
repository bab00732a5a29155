//! Domain events for the runbook aggregate.

use serde::{Deserialize, Serialize};
use taskstream::DomainEvent;

use crate::types::{ProjectId, RunbookId, TaskId, UserId};

/// Everything that can happen to a runbook, as immutable facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunbookEvent {
    /// A runbook was created within a project.
    RunbookCreated {
        /// The new runbook's identity.
        runbook_id: RunbookId,
        /// The project the runbook belongs to.
        project_id: ProjectId,
        /// Human-readable runbook name.
        name: String,
        /// The user owning the runbook.
        owner_id: UserId,
    },
    /// A task was added to the runbook.
    TaskAdded {
        /// The runbook the task belongs to.
        runbook_id: RunbookId,
        /// The new task's identity.
        task_id: TaskId,
        /// The user the task is assigned to.
        assignee_id: UserId,
        /// Human-readable task name.
        name: String,
        /// Free-form task description.
        description: String,
    },
    /// A task was started by its assignee.
    TaskMarkedInProgress {
        /// The runbook the task belongs to.
        runbook_id: RunbookId,
        /// The started task.
        task_id: TaskId,
    },
    /// A task was finished.
    TaskCompleted {
        /// The runbook the task belongs to.
        runbook_id: RunbookId,
        /// The finished task.
        task_id: TaskId,
        /// The user who completed the task.
        user_id: UserId,
    },
    /// The runbook was completed by its owner.
    RunbookCompleted {
        /// The completed runbook.
        runbook_id: RunbookId,
        /// The user who completed the runbook.
        user_id: UserId,
    },
}

/// Discriminator for [`RunbookEvent::RunbookCreated`].
pub const RUNBOOK_CREATED: &str = "RunbookCreated";
/// Discriminator for [`RunbookEvent::TaskAdded`].
pub const TASK_ADDED: &str = "TaskAdded";
/// Discriminator for [`RunbookEvent::TaskMarkedInProgress`].
pub const TASK_MARKED_IN_PROGRESS: &str = "TaskMarkedInProgress";
/// Discriminator for [`RunbookEvent::TaskCompleted`].
pub const TASK_COMPLETED: &str = "TaskCompleted";
/// Discriminator for [`RunbookEvent::RunbookCompleted`].
pub const RUNBOOK_COMPLETED: &str = "RunbookCompleted";

impl RunbookEvent {
    /// The runbook this event belongs to.
    pub const fn runbook_id(&self) -> &RunbookId {
        match self {
            Self::RunbookCreated { runbook_id, .. }
            | Self::TaskAdded { runbook_id, .. }
            | Self::TaskMarkedInProgress { runbook_id, .. }
            | Self::TaskCompleted { runbook_id, .. }
            | Self::RunbookCompleted { runbook_id, .. } => runbook_id,
        }
    }
}

impl DomainEvent for RunbookEvent {
    fn type_name(&self) -> &'static str {
        match self {
            Self::RunbookCreated { .. } => RUNBOOK_CREATED,
            Self::TaskAdded { .. } => TASK_ADDED,
            Self::TaskMarkedInProgress { .. } => TASK_MARKED_IN_PROGRESS,
            Self::TaskCompleted { .. } => TASK_COMPLETED,
            Self::RunbookCompleted { .. } => RUNBOOK_COMPLETED,
        }
    }

    fn recognizes(type_name: &str) -> bool {
        matches!(
            type_name,
            RUNBOOK_CREATED
                | TASK_ADDED
                | TASK_MARKED_IN_PROGRESS
                | TASK_COMPLETED
                | RUNBOOK_COMPLETED
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskstream::NewEvent;

    #[test]
    fn type_name_matches_variant() {
        let event = RunbookEvent::RunbookCreated {
            runbook_id: RunbookId::try_new("r1").unwrap(),
            project_id: ProjectId::try_new("p1").unwrap(),
            name: "deploy".to_string(),
            owner_id: UserId::try_new("u1").unwrap(),
        };
        assert_eq!(event.type_name(), RUNBOOK_CREATED);
        assert!(RunbookEvent::recognizes(RUNBOOK_CREATED));
        assert!(!RunbookEvent::recognizes("RunbookArchived"));
    }

    #[test]
    fn events_roundtrip_through_the_codec() {
        let event = RunbookEvent::TaskCompleted {
            runbook_id: RunbookId::try_new("r1").unwrap(),
            task_id: TaskId::try_new("t1").unwrap(),
            user_id: UserId::try_new("u1").unwrap(),
        };
        let new_event = NewEvent::encode(&event).unwrap();
        assert_eq!(new_event.type_name, TASK_COMPLETED);

        let decoded: RunbookEvent = serde_json::from_value(new_event.payload).unwrap();
        assert_eq!(decoded, event);
    }
}
