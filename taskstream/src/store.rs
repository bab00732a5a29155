//! Event store abstraction.
//!
//! This module defines the [`EventStore`] trait that serves as the port
//! interface for storage backends. The trait is backend-independent: a
//! backend only has to provide an append-only log keyed by
//! `(aggregate_id, sequence_number)` with a uniqueness constraint on that
//! pair, plus per-stream and full-log scans.

use crate::errors::EventStoreResult;
use crate::event::{EventRecord, NewEvent};
use crate::types::{AggregateId, SequenceNumber};
use async_trait::async_trait;

/// The append-only event log, keyed by aggregate identity.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends `events` to the aggregate's stream atomically.
    ///
    /// The store assigns sequence numbers
    /// `expected_version + 1 ..= expected_version + events.len()` and the
    /// commit timestamp, and returns the committed records in order. The
    /// batch is all-or-nothing: no partial append is ever visible.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError::VersionConflict`] if the stream's latest
    /// sequence number does not equal `expected_version` at the moment of
    /// commit (optimistic concurrency), or a storage-level error if the
    /// backend fails.
    ///
    /// [`EventStoreError::VersionConflict`]: crate::errors::EventStoreError::VersionConflict
    async fn append(
        &self,
        aggregate_id: &AggregateId,
        expected_version: SequenceNumber,
        events: Vec<NewEvent>,
    ) -> EventStoreResult<Vec<EventRecord>>;

    /// Loads the ordered event history for one aggregate.
    ///
    /// Returns records in ascending sequence order; an empty vec if the
    /// aggregate never existed. Each call reads a consistent, fully ordered
    /// prefix snapshot - nothing is cached between calls.
    async fn load_stream(&self, aggregate_id: &AggregateId) -> EventStoreResult<Vec<EventRecord>>;

    /// Loads all events across all aggregates in global commit order.
    ///
    /// Used for projection rebuild and audit.
    async fn load_all(&self) -> EventStoreResult<Vec<EventRecord>>;
}
