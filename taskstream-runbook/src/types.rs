//! Identifier types for the runbook domain.

use nutype::nutype;
use taskstream::types::AggregateId;
use uuid::Uuid;

/// Identifies one runbook aggregate.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 64),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct RunbookId(String);

impl RunbookId {
    /// Generates a fresh time-ordered identifier.
    pub fn generate() -> Self {
        Self::try_new(Uuid::now_v7().to_string()).expect("generated id is non-empty")
    }
}

/// Identifies one task within a runbook.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 64),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh time-ordered identifier.
    pub fn generate() -> Self {
        Self::try_new(Uuid::now_v7().to_string()).expect("generated id is non-empty")
    }
}

/// Identifies a user (runbook owner or task assignee).
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 64),
    derive(
        Debug, Clone, PartialEq, Eq, Hash, AsRef, Deref, Display, Serialize, Deserialize
    )
)]
pub struct UserId(String);

/// Identifies the project a runbook belongs to.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 64),
    derive(
        Debug, Clone, PartialEq, Eq, Hash, AsRef, Deref, Display, Serialize, Deserialize
    )
)]
pub struct ProjectId(String);

/// Lifecycle of a task within a runbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Added but not yet started.
    Pending,
    /// Started by its assignee.
    InProgress,
    /// Finished.
    Completed,
}

/// Maps a runbook identity to its event stream's aggregate identity.
pub fn runbook_stream(runbook_id: &RunbookId) -> AggregateId {
    AggregateId::try_new(runbook_id.as_ref()).expect("runbook ids are valid aggregate ids")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_runbook_ids_are_unique() {
        assert_ne!(RunbookId::generate(), RunbookId::generate());
    }

    #[test]
    fn runbook_stream_preserves_the_identifier() {
        let id = RunbookId::try_new("r1").unwrap();
        assert_eq!(runbook_stream(&id).as_ref(), "r1");
    }

    #[test]
    fn blank_identifiers_are_rejected() {
        assert!(RunbookId::try_new("  ").is_err());
        assert!(TaskId::try_new("").is_err());
        assert!(UserId::try_new(" ").is_err());
    }
}
