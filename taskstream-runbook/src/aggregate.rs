//! The runbook aggregate.

use std::collections::HashMap;

use taskstream::errors::{CommandError, CommandResult};
use taskstream::Aggregate;

use crate::commands::RunbookCommand;
use crate::events::RunbookEvent;
use crate::types::{RunbookId, TaskId, TaskStatus, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
struct TaskState {
    assignee_id: UserId,
    status: TaskStatus,
}

/// A runbook's in-memory state, rebuilt by folding its event stream.
///
/// The default value is the state of a runbook that was never created;
/// every command except `Create` is rejected in that state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Runbook {
    runbook_id: Option<RunbookId>,
    owner_id: Option<UserId>,
    completed: bool,
    tasks: HashMap<TaskId, TaskState>,
}

impl Runbook {
    /// Whether a `RunbookCreated` event has been applied.
    pub const fn exists(&self) -> bool {
        self.runbook_id.is_some()
    }

    /// Whether the runbook has reached its terminal state.
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Number of tasks ever added to the runbook.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Current status of one task, if it exists.
    pub fn task_status(&self, task_id: &TaskId) -> Option<TaskStatus> {
        self.tasks.get(task_id).map(|t| t.status)
    }

    /// Rejects commands addressed to a different runbook or arriving after
    /// the terminal state.
    fn ensure_open(&self, target: &RunbookId) -> CommandResult<()> {
        let Some(own_id) = &self.runbook_id else {
            return Err(CommandError::BusinessRuleViolation(
                "runbook does not exist".to_string(),
            ));
        };
        if own_id != target {
            return Err(CommandError::AggregateMismatch {
                expected: own_id.to_string(),
                actual: target.to_string(),
            });
        }
        if self.completed {
            return Err(CommandError::BusinessRuleViolation(
                "runbook is already completed".to_string(),
            ));
        }
        Ok(())
    }
}

impl Aggregate for Runbook {
    type Event = RunbookEvent;
    type Command = RunbookCommand;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            RunbookEvent::RunbookCreated {
                runbook_id,
                owner_id,
                ..
            } => {
                self.runbook_id = Some(runbook_id.clone());
                self.owner_id = Some(owner_id.clone());
            }
            RunbookEvent::TaskAdded {
                task_id,
                assignee_id,
                ..
            } => {
                self.tasks.insert(
                    task_id.clone(),
                    TaskState {
                        assignee_id: assignee_id.clone(),
                        status: TaskStatus::Pending,
                    },
                );
            }
            RunbookEvent::TaskMarkedInProgress { task_id, .. } => {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    task.status = TaskStatus::InProgress;
                }
            }
            RunbookEvent::TaskCompleted { task_id, .. } => {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    task.status = TaskStatus::Completed;
                }
            }
            RunbookEvent::RunbookCompleted { .. } => {
                self.completed = true;
            }
        }
    }

    fn handle(&self, command: Self::Command) -> CommandResult<Vec<Self::Event>> {
        match command {
            RunbookCommand::Create {
                runbook_id,
                project_id,
                name,
                owner_id,
            } => {
                if self.exists() {
                    return Err(CommandError::BusinessRuleViolation(
                        "runbook already created".to_string(),
                    ));
                }
                Ok(vec![RunbookEvent::RunbookCreated {
                    runbook_id,
                    project_id,
                    name,
                    owner_id,
                }])
            }
            RunbookCommand::AddTask {
                runbook_id,
                task_id,
                assignee_id,
                name,
                description,
            } => {
                self.ensure_open(&runbook_id)?;
                if self.tasks.contains_key(&task_id) {
                    return Err(CommandError::BusinessRuleViolation(
                        "task already added".to_string(),
                    ));
                }
                Ok(vec![RunbookEvent::TaskAdded {
                    runbook_id,
                    task_id,
                    assignee_id,
                    name,
                    description,
                }])
            }
            RunbookCommand::StartTask {
                runbook_id,
                task_id,
            } => {
                self.ensure_open(&runbook_id)?;
                match self.task_status(&task_id) {
                    Some(TaskStatus::Pending) => Ok(vec![RunbookEvent::TaskMarkedInProgress {
                        runbook_id,
                        task_id,
                    }]),
                    Some(_) => Err(CommandError::BusinessRuleViolation(
                        "task is not pending".to_string(),
                    )),
                    None => Err(CommandError::BusinessRuleViolation(
                        "task does not exist".to_string(),
                    )),
                }
            }
            RunbookCommand::CompleteTask {
                runbook_id,
                task_id,
                user_id,
            } => {
                self.ensure_open(&runbook_id)?;
                let Some(task) = self.tasks.get(&task_id) else {
                    return Err(CommandError::BusinessRuleViolation(
                        "task does not exist".to_string(),
                    ));
                };
                if task.status != TaskStatus::InProgress {
                    return Err(CommandError::BusinessRuleViolation(
                        "task is not in progress".to_string(),
                    ));
                }
                if task.assignee_id != user_id {
                    return Err(CommandError::BusinessRuleViolation(
                        "only the assignee can complete a task".to_string(),
                    ));
                }
                Ok(vec![RunbookEvent::TaskCompleted {
                    runbook_id,
                    task_id,
                    user_id,
                }])
            }
            RunbookCommand::Complete {
                runbook_id,
                user_id,
            } => {
                self.ensure_open(&runbook_id)?;
                if self.owner_id.as_ref() != Some(&user_id) {
                    return Err(CommandError::BusinessRuleViolation(
                        "only the owner can complete a runbook".to_string(),
                    ));
                }
                let in_progress = self
                    .tasks
                    .values()
                    .any(|t| t.status == TaskStatus::InProgress);
                if in_progress {
                    return Err(CommandError::BusinessRuleViolation(
                        "cannot complete a runbook while tasks are in progress".to_string(),
                    ));
                }
                Ok(vec![RunbookEvent::RunbookCompleted {
                    runbook_id,
                    user_id,
                }])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProjectId;
    use proptest::prelude::*;

    fn runbook_id() -> RunbookId {
        RunbookId::try_new("r1").unwrap()
    }

    fn owner() -> UserId {
        UserId::try_new("owner").unwrap()
    }

    fn create_command() -> RunbookCommand {
        RunbookCommand::Create {
            runbook_id: runbook_id(),
            project_id: ProjectId::try_new("p1").unwrap(),
            name: "deploy".to_string(),
            owner_id: owner(),
        }
    }

    fn created_runbook() -> Runbook {
        let mut runbook = Runbook::default();
        for event in &Runbook::default().handle(create_command()).unwrap() {
            runbook.apply(event);
        }
        runbook
    }

    fn add_task_command(task: &str) -> RunbookCommand {
        RunbookCommand::AddTask {
            runbook_id: runbook_id(),
            task_id: TaskId::try_new(task).unwrap(),
            assignee_id: owner(),
            name: format!("{task}-name"),
            description: String::new(),
        }
    }

    fn apply_all(runbook: &mut Runbook, events: &[RunbookEvent]) {
        for event in events {
            runbook.apply(event);
        }
    }

    #[test]
    fn create_produces_runbook_created() {
        let events = Runbook::default().handle(create_command()).unwrap();
        assert!(matches!(events[0], RunbookEvent::RunbookCreated { .. }));
    }

    #[test]
    fn create_twice_is_rejected() {
        let result = created_runbook().handle(create_command());
        assert!(matches!(
            result,
            Err(CommandError::BusinessRuleViolation(_))
        ));
    }

    #[test]
    fn commands_on_nonexistent_runbook_are_rejected() {
        let result = Runbook::default().handle(add_task_command("t1"));
        assert!(matches!(
            result,
            Err(CommandError::BusinessRuleViolation(_))
        ));
    }

    #[test]
    fn commands_for_a_different_runbook_are_rejected() {
        let runbook = created_runbook();
        let result = runbook.handle(RunbookCommand::StartTask {
            runbook_id: RunbookId::try_new("r2").unwrap(),
            task_id: TaskId::try_new("t1").unwrap(),
        });
        assert!(matches!(result, Err(CommandError::AggregateMismatch { .. })));
    }

    #[test]
    fn task_lifecycle_runs_pending_in_progress_completed() {
        let mut runbook = created_runbook();
        let task_id = TaskId::try_new("t1").unwrap();

        let events = runbook.handle(add_task_command("t1")).unwrap();
        apply_all(&mut runbook, &events);
        assert_eq!(runbook.task_status(&task_id), Some(TaskStatus::Pending));

        let events = runbook
            .handle(RunbookCommand::StartTask {
                runbook_id: runbook_id(),
                task_id: task_id.clone(),
            })
            .unwrap();
        apply_all(&mut runbook, &events);
        assert_eq!(runbook.task_status(&task_id), Some(TaskStatus::InProgress));

        let events = runbook
            .handle(RunbookCommand::CompleteTask {
                runbook_id: runbook_id(),
                task_id: task_id.clone(),
                user_id: owner(),
            })
            .unwrap();
        apply_all(&mut runbook, &events);
        assert_eq!(runbook.task_status(&task_id), Some(TaskStatus::Completed));
    }

    #[test]
    fn completing_a_task_that_is_not_in_progress_is_rejected() {
        let mut runbook = created_runbook();
        let events = runbook.handle(add_task_command("t1")).unwrap();
        apply_all(&mut runbook, &events);

        let result = runbook.handle(RunbookCommand::CompleteTask {
            runbook_id: runbook_id(),
            task_id: TaskId::try_new("t1").unwrap(),
            user_id: owner(),
        });
        assert!(matches!(
            result,
            Err(CommandError::BusinessRuleViolation(_))
        ));
    }

    #[test]
    fn only_the_assignee_completes_a_task() {
        let mut runbook = created_runbook();
        let task_id = TaskId::try_new("t1").unwrap();
        let events = runbook.handle(add_task_command("t1")).unwrap();
        apply_all(&mut runbook, &events);
        let events = runbook
            .handle(RunbookCommand::StartTask {
                runbook_id: runbook_id(),
                task_id: task_id.clone(),
            })
            .unwrap();
        apply_all(&mut runbook, &events);

        let result = runbook.handle(RunbookCommand::CompleteTask {
            runbook_id: runbook_id(),
            task_id,
            user_id: UserId::try_new("someone-else").unwrap(),
        });
        assert!(matches!(
            result,
            Err(CommandError::BusinessRuleViolation(_))
        ));
    }

    #[test]
    fn only_the_owner_completes_the_runbook() {
        let runbook = created_runbook();
        let result = runbook.handle(RunbookCommand::Complete {
            runbook_id: runbook_id(),
            user_id: UserId::try_new("intruder").unwrap(),
        });
        assert!(matches!(
            result,
            Err(CommandError::BusinessRuleViolation(_))
        ));
    }

    #[test]
    fn completed_runbook_rejects_further_commands() {
        let mut runbook = created_runbook();
        let events = runbook
            .handle(RunbookCommand::Complete {
                runbook_id: runbook_id(),
                user_id: owner(),
            })
            .unwrap();
        apply_all(&mut runbook, &events);
        assert!(runbook.is_completed());

        let result = runbook.handle(add_task_command("t1"));
        assert!(matches!(
            result,
            Err(CommandError::BusinessRuleViolation(_))
        ));
    }

    proptest! {
        // Replaying the same stream from empty state is deterministic no
        // matter how often it runs.
        #[test]
        fn replay_is_deterministic(task_names in prop::collection::vec("[a-z]{1,8}", 0..10)) {
            let mut stream = Runbook::default().handle(create_command()).unwrap();
            let mut runbook = Runbook::default();
            apply_all(&mut runbook, &stream);

            for (i, name) in task_names.iter().enumerate() {
                let command = RunbookCommand::AddTask {
                    runbook_id: runbook_id(),
                    task_id: TaskId::try_new(format!("{name}-{i}")).unwrap(),
                    assignee_id: owner(),
                    name: name.clone(),
                    description: String::new(),
                };
                let events = runbook.handle(command).unwrap();
                apply_all(&mut runbook, &events);
                stream.extend(events);
            }

            let mut first = Runbook::default();
            apply_all(&mut first, &stream);
            let mut second = Runbook::default();
            apply_all(&mut second, &stream);

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.task_count(), task_names.len());
        }
    }
}
