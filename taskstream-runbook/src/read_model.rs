//! Read-model projections for the runbook domain.
//!
//! Two projections materialize the queryable side: the runbook list (an
//! existence read model: a runbook appears on creation and disappears on
//! completion) and the task list per runbook. Each projection exclusively
//! owns its store; the query layer reads the stores and never touches the
//! event log. Both stores can be rebuilt from empty by replaying the full
//! log through [`taskstream::rebuild`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use taskstream::errors::ProjectionError;
use taskstream::event::EventRecord;
use taskstream::projection::Projection;

use crate::events::{
    RunbookEvent, RUNBOOK_COMPLETED, RUNBOOK_CREATED, TASK_ADDED, TASK_COMPLETED,
    TASK_MARKED_IN_PROGRESS,
};
use crate::types::{ProjectId, RunbookId, TaskId, TaskStatus, UserId};

/// One row of the runbook list read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunbookEntity {
    /// The runbook's identity.
    pub runbook_id: RunbookId,
    /// The project the runbook belongs to.
    pub project_id: ProjectId,
    /// Human-readable runbook name.
    pub name: String,
    /// The owning user.
    pub owner_id: UserId,
}

/// One row of the task read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntity {
    /// The runbook the task belongs to.
    pub runbook_id: RunbookId,
    /// The task's identity.
    pub task_id: TaskId,
    /// The user the task is assigned to.
    pub assignee_id: UserId,
    /// Human-readable task name.
    pub name: String,
    /// Free-form task description.
    pub description: String,
    /// Current lifecycle status.
    pub status: TaskStatus,
}

/// Queryable store of uncompleted runbooks, owned by
/// [`RunbookListProjection`].
///
/// Clones share storage, so the query layer can hold a handle while the
/// projection keeps the only mutation path.
#[derive(Debug, Clone, Default)]
pub struct RunbookStore {
    entries: Arc<RwLock<HashMap<RunbookId, RunbookEntity>>>,
}

impl RunbookStore {
    /// Looks up one runbook by identity.
    pub fn get(&self, runbook_id: &RunbookId) -> Option<RunbookEntity> {
        self.entries
            .read()
            .expect("RwLock poisoned")
            .get(runbook_id)
            .cloned()
    }

    /// All uncompleted runbooks.
    pub fn all(&self) -> Vec<RunbookEntity> {
        self.entries
            .read()
            .expect("RwLock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Number of uncompleted runbooks.
    pub fn count(&self) -> usize {
        self.entries.read().expect("RwLock poisoned").len()
    }

    fn insert(&self, entity: RunbookEntity) {
        self.entries
            .write()
            .expect("RwLock poisoned")
            .insert(entity.runbook_id.clone(), entity);
    }

    fn remove(&self, runbook_id: &RunbookId) {
        self.entries
            .write()
            .expect("RwLock poisoned")
            .remove(runbook_id);
    }

    fn clear(&self) {
        self.entries.write().expect("RwLock poisoned").clear();
    }
}

/// Queryable store of tasks, owned by [`RunbookTasksProjection`].
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    entries: Arc<RwLock<HashMap<TaskId, TaskEntity>>>,
}

impl TaskStore {
    /// Looks up one task by identity.
    pub fn get(&self, task_id: &TaskId) -> Option<TaskEntity> {
        self.entries
            .read()
            .expect("RwLock poisoned")
            .get(task_id)
            .cloned()
    }

    /// All tasks belonging to one runbook.
    pub fn tasks_for_runbook(&self, runbook_id: &RunbookId) -> Vec<TaskEntity> {
        self.entries
            .read()
            .expect("RwLock poisoned")
            .values()
            .filter(|t| &t.runbook_id == runbook_id)
            .cloned()
            .collect()
    }

    /// Total number of tasks across all runbooks.
    pub fn count(&self) -> usize {
        self.entries.read().expect("RwLock poisoned").len()
    }

    fn insert(&self, entity: TaskEntity) {
        self.entries
            .write()
            .expect("RwLock poisoned")
            .insert(entity.task_id.clone(), entity);
    }

    fn set_status(&self, task_id: &TaskId, status: TaskStatus) {
        if let Some(task) = self
            .entries
            .write()
            .expect("RwLock poisoned")
            .get_mut(task_id)
        {
            task.status = status;
        }
    }

    fn clear(&self) {
        self.entries.write().expect("RwLock poisoned").clear();
    }
}

/// Materializes the runbook list from creation and completion events.
#[derive(Debug, Default)]
pub struct RunbookListProjection {
    store: RunbookStore,
}

impl RunbookListProjection {
    /// Creates the projection with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A query handle onto the projection's store.
    pub fn store(&self) -> RunbookStore {
        self.store.clone()
    }
}

impl Projection for RunbookListProjection {
    fn name(&self) -> &str {
        "runbook-list"
    }

    fn accepts(&self, record: &EventRecord) -> bool {
        matches!(
            record.type_name.as_str(),
            RUNBOOK_CREATED | RUNBOOK_COMPLETED
        )
    }

    fn apply(&self, record: &EventRecord) -> Result<(), ProjectionError> {
        let Some(event) = record.decode::<RunbookEvent>()? else {
            return Ok(());
        };
        match event {
            RunbookEvent::RunbookCreated {
                runbook_id,
                project_id,
                name,
                owner_id,
            } => {
                debug!(%runbook_id, "materializing runbook entity");
                self.store.insert(RunbookEntity {
                    runbook_id,
                    project_id,
                    name,
                    owner_id,
                });
            }
            RunbookEvent::RunbookCompleted { runbook_id, .. } => {
                debug!(%runbook_id, "removing completed runbook entity");
                self.store.remove(&runbook_id);
            }
            // Outside this projection's interest set; filtered by accepts()
            // but the match stays total over the enum.
            RunbookEvent::TaskAdded { .. }
            | RunbookEvent::TaskMarkedInProgress { .. }
            | RunbookEvent::TaskCompleted { .. } => {}
        }
        Ok(())
    }

    fn reset(&self) {
        self.store.clear();
    }
}

/// Materializes the per-runbook task list from task lifecycle events.
#[derive(Debug, Default)]
pub struct RunbookTasksProjection {
    store: TaskStore,
}

impl RunbookTasksProjection {
    /// Creates the projection with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A query handle onto the projection's store.
    pub fn store(&self) -> TaskStore {
        self.store.clone()
    }
}

impl Projection for RunbookTasksProjection {
    fn name(&self) -> &str {
        "runbook-tasks"
    }

    fn accepts(&self, record: &EventRecord) -> bool {
        matches!(
            record.type_name.as_str(),
            TASK_ADDED | TASK_MARKED_IN_PROGRESS | TASK_COMPLETED
        )
    }

    fn apply(&self, record: &EventRecord) -> Result<(), ProjectionError> {
        let Some(event) = record.decode::<RunbookEvent>()? else {
            return Ok(());
        };
        match event {
            RunbookEvent::TaskAdded {
                runbook_id,
                task_id,
                assignee_id,
                name,
                description,
            } => {
                debug!(%runbook_id, %task_id, "materializing task entity");
                self.store.insert(TaskEntity {
                    runbook_id,
                    task_id,
                    assignee_id,
                    name,
                    description,
                    status: TaskStatus::Pending,
                });
            }
            RunbookEvent::TaskMarkedInProgress { task_id, .. } => {
                self.store.set_status(&task_id, TaskStatus::InProgress);
            }
            RunbookEvent::TaskCompleted { task_id, .. } => {
                self.store.set_status(&task_id, TaskStatus::Completed);
            }
            RunbookEvent::RunbookCreated { .. } | RunbookEvent::RunbookCompleted { .. } => {}
        }
        Ok(())
    }

    fn reset(&self) {
        self.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskstream::types::{AggregateId, SequenceNumber, Timestamp};
    use taskstream::{DomainEvent, NewEvent};

    fn record_for(event: &RunbookEvent, sequence: u64) -> EventRecord {
        let new_event = NewEvent::encode(event).unwrap();
        EventRecord {
            aggregate_id: AggregateId::try_new(event.runbook_id().as_ref()).unwrap(),
            type_name: new_event.type_name,
            sequence_number: SequenceNumber::try_new(sequence).unwrap(),
            occurred_on: Timestamp::now(),
            payload: new_event.payload,
        }
    }

    fn created(runbook: &str) -> RunbookEvent {
        RunbookEvent::RunbookCreated {
            runbook_id: RunbookId::try_new(runbook).unwrap(),
            project_id: ProjectId::try_new("p1").unwrap(),
            name: "deploy".to_string(),
            owner_id: UserId::try_new("owner").unwrap(),
        }
    }

    fn task_added(runbook: &str, task: &str) -> RunbookEvent {
        RunbookEvent::TaskAdded {
            runbook_id: RunbookId::try_new(runbook).unwrap(),
            task_id: TaskId::try_new(task).unwrap(),
            assignee_id: UserId::try_new("owner").unwrap(),
            name: format!("{task}-name"),
            description: String::new(),
        }
    }

    #[test]
    fn runbook_list_tracks_existence() {
        let projection = RunbookListProjection::new();
        let store = projection.store();

        projection.apply(&record_for(&created("r1"), 1)).unwrap();
        assert_eq!(store.count(), 1);
        let entity = store.get(&RunbookId::try_new("r1").unwrap()).unwrap();
        assert_eq!(entity.name, "deploy");

        let completed = RunbookEvent::RunbookCompleted {
            runbook_id: RunbookId::try_new("r1").unwrap(),
            user_id: UserId::try_new("owner").unwrap(),
        };
        projection.apply(&record_for(&completed, 2)).unwrap();
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn tasks_projection_only_accepts_task_events() {
        let projection = RunbookTasksProjection::new();

        assert!(!projection.accepts(&record_for(&created("r1"), 1)));
        assert!(projection.accepts(&record_for(&task_added("r1", "t1"), 2)));
    }

    #[test]
    fn tasks_projection_never_mutates_on_foreign_event_types() {
        let projection = RunbookTasksProjection::new();
        let store = projection.store();

        // Even if a foreign record slips past accepts(), apply leaves the
        // read model untouched.
        projection.apply(&record_for(&created("r1"), 1)).unwrap();
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn task_status_follows_lifecycle_events() {
        let projection = RunbookTasksProjection::new();
        let store = projection.store();
        let task_id = TaskId::try_new("t1").unwrap();

        projection
            .apply(&record_for(&task_added("r1", "t1"), 1))
            .unwrap();
        assert_eq!(store.get(&task_id).unwrap().status, TaskStatus::Pending);

        let started = RunbookEvent::TaskMarkedInProgress {
            runbook_id: RunbookId::try_new("r1").unwrap(),
            task_id: task_id.clone(),
        };
        projection.apply(&record_for(&started, 2)).unwrap();
        assert_eq!(store.get(&task_id).unwrap().status, TaskStatus::InProgress);
    }

    #[test]
    fn reset_clears_the_read_model() {
        let projection = RunbookListProjection::new();
        let store = projection.store();

        projection.apply(&record_for(&created("r1"), 1)).unwrap();
        assert_eq!(store.count(), 1);

        projection.reset();
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn unknown_type_names_are_a_no_op() {
        let projection = RunbookTasksProjection::new();
        let record = EventRecord {
            aggregate_id: AggregateId::try_new("r1").unwrap(),
            type_name: "TaskArchived".to_string(),
            sequence_number: SequenceNumber::try_new(1).unwrap(),
            occurred_on: Timestamp::now(),
            payload: serde_json::json!({}),
        };

        assert!(!projection.accepts(&record));
        assert!(!RunbookEvent::recognizes(&record.type_name));
        projection.apply(&record).unwrap();
        assert_eq!(projection.store().count(), 0);
    }
}
