//! Aggregate reconstruction and command execution.
//!
//! An aggregate is a consistency boundary whose state is fully and only a
//! function of the fold of its event stream. Aggregate instances exist
//! only transiently: [`Repository::execute`] constructs one by replay,
//! applies the command, persists the produced events, and discards the
//! instance. No aggregate state is ever stored directly.

use std::marker::PhantomData;

use tracing::{debug, instrument};

use crate::errors::{CommandResult, EventStoreResult};
use crate::event::NewEvent;
use crate::store::EventStore;
use crate::types::{AggregateId, SequenceNumber};
use crate::DomainEvent;

/// A unit of consistency rebuilt by folding its event stream.
///
/// `Default` provides the empty initial state for a stream that has no
/// events yet. `apply` is the fold step and must be total over the event
/// enum; `handle` is a pure function of (state, command) producing new
/// events, and never performs persistence itself.
pub trait Aggregate: Default + Send + Sync {
    /// The event type this aggregate emits and folds.
    type Event: DomainEvent;
    /// The command type this aggregate handles.
    type Command;

    /// Folds one historical event into the state.
    fn apply(&mut self, event: &Self::Event);

    /// Produces the events representing the effect of `command` on the
    /// current state (zero or more).
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::AggregateMismatch`] when the command
    /// references a different aggregate identity than the loaded one, or
    /// [`CommandError::BusinessRuleViolation`] when an aggregate-specific
    /// invariant is violated.
    ///
    /// [`CommandError::AggregateMismatch`]: crate::errors::CommandError::AggregateMismatch
    /// [`CommandError::BusinessRuleViolation`]: crate::errors::CommandError::BusinessRuleViolation
    fn handle(&self, command: Self::Command) -> CommandResult<Vec<Self::Event>>;
}

/// The result of a successfully executed command.
#[derive(Debug)]
pub struct ExecutionOutcome<E> {
    /// The events the command produced, in the order they were appended.
    pub events: Vec<E>,
    /// The aggregate's stream version after the append.
    pub version: SequenceNumber,
}

/// Loads aggregates by replay and runs commands against them.
///
/// The repository is the only collaborator that touches both the store and
/// the aggregate: command intake hands it a target identity plus a command
/// and receives either an [`ExecutionOutcome`] or a typed failure.
#[derive(Debug, Clone)]
pub struct Repository<A, S> {
    store: S,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A, S> Repository<A, S>
where
    A: Aggregate,
    S: EventStore,
{
    /// Creates a repository backed by the given store.
    ///
    /// Pass a [`PublishingStore`](crate::bus::PublishingStore) so that
    /// committed events reach the registered projections.
    pub const fn new(store: S) -> Self {
        Self {
            store,
            _aggregate: PhantomData,
        }
    }

    /// Rebuilds the aggregate's current state by replaying its stream.
    ///
    /// Starts from the empty state and folds `apply` over the ordered
    /// stream. Records whose `type_name` the event enum does not recognize
    /// are skipped without failing the fold, but still count toward the
    /// returned version: the version is the stream's latest sequence
    /// number, which is what the next append's concurrency check compares
    /// against.
    ///
    /// # Errors
    ///
    /// Returns a store error if the stream cannot be read, or a
    /// deserialization error if a recognized event type is corrupt.
    pub async fn load(&self, aggregate_id: &AggregateId) -> EventStoreResult<(A, SequenceNumber)> {
        let records = self.store.load_stream(aggregate_id).await?;

        let mut state = A::default();
        let mut version = SequenceNumber::initial();
        for record in &records {
            version = record.sequence_number;
            match record.decode::<A::Event>()? {
                Some(event) => state.apply(&event),
                None => {
                    debug!(
                        aggregate_id = %aggregate_id,
                        type_name = %record.type_name,
                        "skipping unrecognized event type during replay"
                    );
                }
            }
        }

        Ok((state, version))
    }

    /// Executes one command against the aggregate.
    ///
    /// Loads the aggregate, handles the command, appends the produced
    /// events with the loaded version as the expected version, and returns
    /// the events plus the new version. A command that produces zero events
    /// succeeds without touching the store.
    ///
    /// # Errors
    ///
    /// Surfaces the aggregate's command errors as well as store failures;
    /// a wrapped version conflict means a concurrent writer won the race
    /// and the caller should reload and retry.
    #[instrument(skip_all, fields(aggregate_id = %aggregate_id))]
    pub async fn execute(
        &self,
        aggregate_id: &AggregateId,
        command: A::Command,
    ) -> CommandResult<ExecutionOutcome<A::Event>> {
        let (state, version) = self.load(aggregate_id).await?;
        let events = state.handle(command)?;

        if events.is_empty() {
            debug!("command produced no events");
            return Ok(ExecutionOutcome { events, version });
        }

        let new_events = events
            .iter()
            .map(NewEvent::encode)
            .collect::<EventStoreResult<Vec<_>>>()?;
        let records = self.store.append(aggregate_id, version, new_events).await?;

        let version = records.last().map_or(version, |r| r.sequence_number);
        debug!(appended = records.len(), version = %version, "command committed");

        Ok(ExecutionOutcome { events, version })
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }
}
