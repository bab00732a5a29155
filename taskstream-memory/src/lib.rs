//! In-memory backend for the `taskstream` event sourcing engine.
//!
//! This crate provides an in-memory implementation of the `EventStore`
//! trait, the single persistence backend assumed by the engine. It is
//! suitable for tests and single-process deployments where durability
//! across restarts is not required.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use taskstream::errors::{EventStoreError, EventStoreResult};
use taskstream::event::{EventRecord, NewEvent};
use taskstream::store::EventStore;
use taskstream::types::{AggregateId, SequenceNumber, Timestamp};

/// Thread-safe in-memory event store.
///
/// Clones share storage, so a store handle can be passed to every
/// collaborator that needs it. Streams are kept per aggregate for
/// `load_stream`; a separate global log preserves commit order across
/// aggregates for `load_all`.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    // Maps aggregate IDs to their stored events, in sequence order
    streams: Arc<RwLock<HashMap<AggregateId, Vec<EventRecord>>>>,
    // All events across all aggregates, in commit order
    log: Arc<RwLock<Vec<EventRecord>>>,
}

impl InMemoryEventStore {
    /// Create a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        aggregate_id: &AggregateId,
        expected_version: SequenceNumber,
        events: Vec<NewEvent>,
    ) -> EventStoreResult<Vec<EventRecord>> {
        // Both locks are held for the whole append so the version check,
        // the stream write, and the commit-log write are one atomic step.
        let mut streams = self.streams.write().expect("RwLock poisoned");
        let mut log = self.log.write().expect("RwLock poisoned");

        let stream = streams.entry(aggregate_id.clone()).or_default();
        let current_version = stream
            .last()
            .map_or_else(SequenceNumber::initial, |e| e.sequence_number);

        if current_version != expected_version {
            return Err(EventStoreError::VersionConflict {
                aggregate_id: aggregate_id.clone(),
                expected: expected_version,
                current: current_version,
            });
        }

        let mut sequence_number = current_version;
        let mut committed = Vec::with_capacity(events.len());

        for event in events {
            sequence_number = sequence_number.next();
            let record = EventRecord {
                aggregate_id: aggregate_id.clone(),
                type_name: event.type_name,
                sequence_number,
                occurred_on: Timestamp::now(),
                payload: event.payload,
            };
            stream.push(record.clone());
            log.push(record.clone());
            committed.push(record);
        }

        Ok(committed)
    }

    async fn load_stream(&self, aggregate_id: &AggregateId) -> EventStoreResult<Vec<EventRecord>> {
        let streams = self.streams.read().expect("RwLock poisoned");

        Ok(streams.get(aggregate_id).cloned().unwrap_or_default())
    }

    async fn load_all(&self) -> EventStoreResult<Vec<EventRecord>> {
        let log = self.log.read().expect("RwLock poisoned");

        Ok(log.clone())
    }
}
