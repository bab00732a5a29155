//! Event publication: the subscription registry and the publishing store.
//!
//! Fan-out is an explicit in-process list of subscriber handles invoked
//! synchronously in registration order - no generic observable machinery.
//! The registry is constructed once at process start and passed by handle
//! to every collaborator that needs it; subscribers register during
//! initialization and stay registered for the process lifetime.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::errors::{EventStoreResult, ProjectionError};
use crate::event::{EventRecord, NewEvent};
use crate::projection::Projection;
use crate::store::EventStore;
use crate::types::{AggregateId, SequenceNumber};

/// A record of one subscriber failing to apply one published event.
///
/// Failures are isolated per subscriber and per event: they never halt
/// delivery to the remaining subscribers and never roll back the committed
/// event. Publication is best-effort, at-least-once-attempted; the recovery
/// path for a lagging projection is [`rebuild`](crate::projection::rebuild).
#[derive(Debug)]
pub struct ProjectionFailure {
    /// Name of the subscriber that failed.
    pub projection: String,
    /// Aggregate of the event that could not be applied.
    pub aggregate_id: AggregateId,
    /// Sequence number of the event that could not be applied.
    pub sequence_number: SequenceNumber,
    /// The underlying projection error.
    pub source: ProjectionError,
}

/// Process-wide registry of projection subscribers.
///
/// Mutated only at initialization time, read-only (iterated) thereafter.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscribers: RwLock<Vec<Arc<dyn Projection>>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a projection subscriber.
    ///
    /// Idempotent per distinct subscriber instance; registering the same
    /// `Arc` twice is a no-op. Registration order becomes the delivery
    /// order among subscribers for each event.
    pub fn subscribe(&self, subscriber: Arc<dyn Projection>) {
        let mut subscribers = self.subscribers.write().expect("RwLock poisoned");
        if subscribers.iter().any(|s| Arc::ptr_eq(s, &subscriber)) {
            debug!(
                projection = subscriber.name(),
                "subscriber already registered"
            );
            return;
        }
        info!(projection = subscriber.name(), "registering projection subscriber");
        subscribers.push(subscriber);
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.read().expect("RwLock poisoned").len()
    }

    /// Whether no subscribers are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `record` to every registered subscriber, in registration
    /// order, synchronously within the calling operation.
    ///
    /// A subscriber raising an error is recorded as a [`ProjectionFailure`]
    /// for that subscriber and that event but does not halt delivery to the
    /// remaining subscribers. Failures are also logged here, so callers on
    /// the write path may discard the returned list.
    pub fn publish(&self, record: &EventRecord) -> Vec<ProjectionFailure> {
        let subscribers = self.subscribers.read().expect("RwLock poisoned");
        let mut failures = Vec::new();

        for subscriber in subscribers.iter() {
            if !subscriber.accepts(record) {
                continue;
            }
            if let Err(source) = subscriber.apply(record) {
                error!(
                    projection = subscriber.name(),
                    aggregate_id = %record.aggregate_id,
                    sequence_number = %record.sequence_number,
                    error = %source,
                    "projection failed to apply published event"
                );
                failures.push(ProjectionFailure {
                    projection: subscriber.name().to_string(),
                    aggregate_id: record.aggregate_id.clone(),
                    sequence_number: record.sequence_number,
                    source,
                });
            }
        }
        failures
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("subscribers", &self.len())
            .finish()
    }
}

/// An [`EventStore`] that publishes every committed event to a
/// [`SubscriptionRegistry`].
///
/// Publication happens only after the inner backend has confirmed
/// durability, and `append` does not return until every subscriber has
/// been offered each event - durability is never claimed before
/// publication completes, and publication is never observed before
/// durability.
#[derive(Debug, Clone)]
pub struct PublishingStore<S> {
    inner: S,
    registry: Arc<SubscriptionRegistry>,
}

impl<S: EventStore> PublishingStore<S> {
    /// Wraps a backend store with a subscription registry.
    pub const fn new(inner: S, registry: Arc<SubscriptionRegistry>) -> Self {
        Self { inner, registry }
    }

    /// The registry events are published to.
    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }
}

#[async_trait]
impl<S: EventStore> EventStore for PublishingStore<S> {
    async fn append(
        &self,
        aggregate_id: &AggregateId,
        expected_version: SequenceNumber,
        events: Vec<NewEvent>,
    ) -> EventStoreResult<Vec<EventRecord>> {
        let records = self
            .inner
            .append(aggregate_id, expected_version, events)
            .await?;

        // Write is durable at this point; subscriber failures are logged
        // by the registry and must not fail the append.
        for record in &records {
            self.registry.publish(record);
        }

        Ok(records)
    }

    async fn load_stream(&self, aggregate_id: &AggregateId) -> EventStoreResult<Vec<EventRecord>> {
        self.inner.load_stream(aggregate_id).await
    }

    async fn load_all(&self) -> EventStoreResult<Vec<EventRecord>> {
        self.inner.load_all().await
    }
}
