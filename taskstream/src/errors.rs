//! Error types for `TaskStream`.
//!
//! Each subsystem has its own error enum so that callers can tell failure
//! classes apart:
//!
//! - [`EventStoreError`]: storage and persistence layer failures, including
//!   optimistic-concurrency conflicts.
//! - [`CommandError`]: business logic and command handling failures.
//! - [`ProjectionError`]: read-model projection failures. These never
//!   propagate into the write path; they degrade only the affected
//!   projection's freshness.

use crate::types::{AggregateId, SequenceNumber};
use thiserror::Error;

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// Optimistic concurrency control detected a conflicting append.
    ///
    /// The caller should reload the aggregate and retry the command.
    #[error(
        "version conflict on aggregate '{aggregate_id}': expected {expected}, current is {current}"
    )]
    VersionConflict {
        /// The aggregate whose stream had the conflict.
        aggregate_id: AggregateId,
        /// The version the writer expected the stream to be at.
        expected: SequenceNumber,
        /// The version the stream was actually at.
        current: SequenceNumber,
    },

    /// Serialization of an event payload failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),

    /// A recognized event type failed to deserialize.
    ///
    /// This is a real fault, never skipped: only *unrecognized* type names
    /// are passed over during replay.
    #[error("deserialization of '{type_name}' failed: {message}")]
    DeserializationFailed {
        /// The discriminator of the record that failed to decode.
        type_name: String,
        /// The underlying serde error description.
        message: String,
    },

    /// The storage backend failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for event store operations.
pub type EventStoreResult<T> = Result<T, EventStoreError>;

/// Errors that can occur during command handling.
///
/// Store-level and command-level errors abort the command and surface
/// synchronously to the caller.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command references an aggregate identity inconsistent with the
    /// loaded aggregate.
    #[error("command targets aggregate '{actual}', loaded aggregate is '{expected}'")]
    AggregateMismatch {
        /// Identity of the aggregate that was loaded.
        expected: String,
        /// Identity the command referenced.
        actual: String,
    },

    /// An aggregate-specific business invariant was violated.
    ///
    /// Surfaced to the caller; not retried automatically.
    #[error("business rule violation: {0}")]
    BusinessRuleViolation(String),

    /// The event store failed while executing the command.
    ///
    /// A wrapped [`EventStoreError::VersionConflict`] means another writer
    /// won the race on this aggregate; reload and retry.
    #[error("event store error: {0}")]
    EventStore(#[from] EventStoreError),
}

/// Result type for command handling.
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors raised by a projection while consuming a published event.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// Decoding the event record into the projection's event type failed.
    #[error("failed to decode event: {0}")]
    Decode(#[from] EventStoreError),

    /// Applying the event to the read model failed.
    #[error("failed to apply event: {0}")]
    Apply(String),
}
