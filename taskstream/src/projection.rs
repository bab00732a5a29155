//! The projection subscriber contract and read-model rebuild support.
//!
//! A projection owns a materialized read model that is created, updated,
//! and removed only in response to published events. Projections are
//! eventually-consistent read caches, not transactional participants: a
//! failing projection never rolls back the committed event, and every
//! projection must be rebuildable from scratch by replaying the full log.

use crate::bus::ProjectionFailure;
use crate::errors::{EventStoreResult, ProjectionError};
use crate::event::EventRecord;
use crate::store::EventStore;
use tracing::{error, info};

/// A subscriber that materializes a read model from published events.
///
/// `apply` is the only path through which the read model is mutated.
/// Implementations decode the record into their domain event enum and match
/// it exhaustively, so new event kinds must be handled or explicitly
/// ignored at the type level.
pub trait Projection: Send + Sync {
    /// A stable name for logs and failure records.
    fn name(&self) -> &str;

    /// Whether this projection is interested in the given record.
    ///
    /// Records outside the declared interest set are a no-op, not an error.
    fn accepts(&self, record: &EventRecord) -> bool;

    /// Applies one published event to the read model.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] if the record cannot be decoded or the
    /// read model cannot be updated. The error is recorded by the caller
    /// and never halts delivery to other subscribers.
    fn apply(&self, record: &EventRecord) -> Result<(), ProjectionError>;

    /// Clears the read model so it can be rebuilt from an empty state.
    fn reset(&self);
}

/// Rebuilds a projection's read model from the full event log.
///
/// Resets the read model, then replays every record from
/// [`EventStore::load_all`] through the projection's `accepts`/`apply`
/// pair. Like live publication, the replay is best-effort: records a
/// projection fails on are reported and skipped rather than aborting the
/// rebuild.
///
/// # Errors
///
/// Returns an error only if the store itself fails; per-record apply
/// failures are returned as [`ProjectionFailure`] values.
pub async fn rebuild<S: EventStore>(
    store: &S,
    projection: &dyn Projection,
) -> EventStoreResult<Vec<ProjectionFailure>> {
    projection.reset();
    let records = store.load_all().await?;
    info!(
        projection = projection.name(),
        events = records.len(),
        "rebuilding projection from event log"
    );

    let mut failures = Vec::new();
    for record in &records {
        if !projection.accepts(record) {
            continue;
        }
        if let Err(source) = projection.apply(record) {
            error!(
                projection = projection.name(),
                aggregate_id = %record.aggregate_id,
                sequence_number = %record.sequence_number,
                error = %source,
                "projection failed to apply event during rebuild"
            );
            failures.push(ProjectionFailure {
                projection: projection.name().to_string(),
                aggregate_id: record.aggregate_id.clone(),
                sequence_number: record.sequence_number,
                source,
            });
        }
    }
    Ok(failures)
}
