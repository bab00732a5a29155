//! The immutable event envelope and the codec between typed domain events
//! and their persisted form.
//!
//! Domain code works with typed event enums implementing [`DomainEvent`].
//! The store persists [`EventRecord`]s: a backend-agnostic envelope carrying
//! the aggregate identity, a `type_name` discriminator, the per-aggregate
//! sequence number, the commit timestamp, and the structured payload.

use crate::errors::{EventStoreError, EventStoreResult};
use crate::types::{AggregateId, SequenceNumber, Timestamp};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A typed domain event that can be persisted through the event store.
///
/// Implementations are tagged-variant enums: every event kind is a variant,
/// `type_name` returns the variant's discriminator, and `recognizes` names
/// the full set of discriminators the type can decode. Discriminators
/// outside that set are skipped during replay (forward compatibility)
/// rather than failing the fold.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync {
    /// The discriminator identifying which event variant this is.
    fn type_name(&self) -> &'static str;

    /// Whether this event type declares the given discriminator.
    fn recognizes(type_name: &str) -> bool;
}

/// An event accepted for persistence but not yet committed.
///
/// Sequence number and timestamp are assigned by the store at commit time,
/// turning the `NewEvent` into an [`EventRecord`].
#[derive(Debug, Clone)]
pub struct NewEvent {
    /// The discriminator of the event variant.
    pub type_name: String,
    /// The variant-specific data fields.
    pub payload: serde_json::Value,
}

impl NewEvent {
    /// Serializes a typed domain event into its persistable form.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError::SerializationFailed`] if the payload
    /// cannot be serialized.
    pub fn encode<E: DomainEvent>(event: &E) -> EventStoreResult<Self> {
        let payload = serde_json::to_value(event)
            .map_err(|e| EventStoreError::SerializationFailed(e.to_string()))?;
        Ok(Self {
            type_name: event.type_name().to_string(),
            payload,
        })
    }
}

/// An immutable event as it exists in the event store.
///
/// Records are never mutated or deleted once appended, and at most one
/// record exists per `(aggregate_id, sequence_number)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// The aggregate this event belongs to.
    pub aggregate_id: AggregateId,
    /// The discriminator identifying which event variant this is.
    pub type_name: String,
    /// The position of this event within its aggregate's stream, starting at 1.
    pub sequence_number: SequenceNumber,
    /// When this event was committed.
    pub occurred_on: Timestamp,
    /// The variant-specific data fields.
    pub payload: serde_json::Value,
}

impl EventRecord {
    /// Decodes this record back into a typed domain event.
    ///
    /// Returns `Ok(None)` when the record's `type_name` is not recognized
    /// by `E`; callers replaying a stream skip such records. A recognized
    /// discriminator whose payload fails to deserialize is an error, never
    /// a silent skip.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError::DeserializationFailed`] if the payload of
    /// a recognized event type cannot be deserialized.
    pub fn decode<E: DomainEvent>(&self) -> EventStoreResult<Option<E>> {
        if !E::recognizes(&self.type_name) {
            return Ok(None);
        }
        serde_json::from_value(self.payload.clone())
            .map(Some)
            .map_err(|e| EventStoreError::DeserializationFailed {
                type_name: self.type_name.clone(),
                message: e.to_string(),
            })
    }
}
