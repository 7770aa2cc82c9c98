//! Append-only event log with optimistic concurrency control.
//!
//! Every aggregate's state is reconstructed from its ordered event history.
//! This crate provides:
//! - [`EventEnvelope`] and [`Version`] — the persisted event record and its
//!   per-aggregate ordering
//! - [`EventStore`] — the storage contract, including the multi-aggregate
//!   [`EventStore::append_atomic`] used by workflow cascades
//! - [`Snapshot`] — an optional cached fold of aggregate state
//! - [`InMemoryEventStore`] and [`PostgresEventStore`] implementations

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod snapshot;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventId, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use snapshot::Snapshot;
pub use store::{AppendBatch, AppendOptions, EventStore, EventStoreExt, EventStream};
