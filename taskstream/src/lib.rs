//! `TaskStream` - Event-sourced persistence for domain aggregates.
//!
//! Every state change is captured as an immutable event, events are the
//! durable source of truth, and current state (both aggregate state and
//! queryable read models) is derived by replaying or consuming that stream.
//!
//! The crate is organised around four pieces:
//!
//! - [`store::EventStore`]: the append-only log keyed by aggregate identity,
//!   with optimistic concurrency on append.
//! - [`aggregate::Repository`]: reconstructs aggregate state by folding the
//!   stream and turns commands into newly appended events.
//! - [`bus::SubscriptionRegistry`] / [`bus::PublishingStore`]: deliver each
//!   committed event, in commit order, to every registered subscriber.
//! - [`projection::Projection`]: the contract read-model projections
//!   implement to consume published events.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod bus;
pub mod errors;
pub mod event;
pub mod projection;
pub mod store;
pub mod types;

pub use aggregate::{Aggregate, ExecutionOutcome, Repository};
pub use bus::{ProjectionFailure, PublishingStore, SubscriptionRegistry};
pub use errors::{
    CommandError, CommandResult, EventStoreError, EventStoreResult, ProjectionError,
};
pub use event::{DomainEvent, EventRecord, NewEvent};
pub use projection::{rebuild, Projection};
pub use store::EventStore;
pub use types::{AggregateId, SequenceNumber, Timestamp};
