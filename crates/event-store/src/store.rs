use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{AggregateId, EventEnvelope, EventStoreError, Result, Snapshot, Version};

/// Options for appending events to the store.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Expected version of the aggregate for optimistic concurrency control.
    /// If None, no version check is performed (use with caution).
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the aggregate to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the aggregate to not exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// One aggregate's share of a multi-aggregate atomic append.
///
/// The workflow orchestrator stages one batch per touched aggregate and
/// hands them to [`EventStore::append_atomic`] so that a cascade either
/// commits for every aggregate or for none.
#[derive(Debug, Clone)]
pub struct AppendBatch {
    /// Events to append, sequentially versioned within one aggregate.
    pub events: Vec<EventEnvelope>,

    /// Concurrency expectations for this aggregate.
    pub options: AppendOptions,
}

impl AppendBatch {
    /// Creates a batch expecting the aggregate to be at `expected_version`.
    pub fn new(events: Vec<EventEnvelope>, expected_version: Version) -> Self {
        Self {
            events,
            options: AppendOptions::expect_version(expected_version),
        }
    }
}

/// A stream of stored events in insertion order.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Core trait for event store implementations.
///
/// All implementations must be thread-safe (Send + Sync). Appends are
/// atomic: either the whole batch is persisted or none of it is.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events for a single aggregate.
    ///
    /// If `options.expected_version` is set, the store reads the aggregate's
    /// current persisted version first and fails with `ConcurrencyConflict`
    /// when it differs — the entire batch is rejected, never a prefix.
    ///
    /// Returns the new version of the aggregate after appending.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version>;

    /// Appends batches for several aggregates in one transaction.
    ///
    /// Every batch's version check must pass, otherwise nothing commits.
    /// This is the all-or-nothing primitive behind multi-aggregate
    /// workflow cascades.
    async fn append_atomic(&self, batches: Vec<AppendBatch>) -> Result<()>;

    /// Retrieves all events for an aggregate in ascending version order.
    async fn events_for_aggregate(&self, aggregate_id: AggregateId) -> Result<Vec<EventEnvelope>>;

    /// Retrieves events for an aggregate starting from a specific version
    /// (inclusive). Serves snapshot-delta rehydration.
    async fn events_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>>;

    /// Streams every event in the store in insertion order.
    ///
    /// Used by projection catch-up and rebuild.
    async fn stream_all(&self) -> Result<EventStream>;

    /// Gets the current persisted version of an aggregate.
    ///
    /// Returns `Version::initial()` (0) for an aggregate that has never
    /// been appended to.
    async fn current_version(&self, aggregate_id: AggregateId) -> Result<Version>;

    /// Saves a snapshot of an aggregate's state.
    ///
    /// Upsert keyed on the aggregate id: only the latest snapshot is kept.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()>;

    /// Retrieves the latest snapshot for an aggregate, if any.
    async fn snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Checks whether an aggregate has any events.
    async fn aggregate_exists(&self, aggregate_id: AggregateId) -> Result<bool> {
        Ok(self.current_version(aggregate_id).await? > Version::initial())
    }

    /// Loads an aggregate's snapshot (if any) and the events after it.
    ///
    /// Without a snapshot, returns `None` and the full event history.
    async fn load_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<(Option<Snapshot>, Vec<EventEnvelope>)> {
        if let Some(snapshot) = self.snapshot(aggregate_id).await? {
            let events = self
                .events_from_version(aggregate_id, snapshot.version.next())
                .await?;
            Ok((Some(snapshot), events))
        } else {
            let events = self.events_for_aggregate(aggregate_id).await?;
            Ok((None, events))
        }
    }
}

// Blanket implementation for all EventStore implementations
impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Validates an append batch before it reaches storage.
///
/// A valid batch is non-empty, targets exactly one aggregate, and carries
/// sequential versions.
pub fn validate_append(events: &[EventEnvelope]) -> Result<()> {
    let first = events
        .first()
        .ok_or_else(|| EventStoreError::InvalidAppend("empty event batch".to_string()))?;

    for event in events.iter().skip(1) {
        if event.aggregate_id != first.aggregate_id {
            return Err(EventStoreError::InvalidAppend(
                "all events in a batch must target the same aggregate".to_string(),
            ));
        }
        if event.aggregate_type != first.aggregate_type {
            return Err(EventStoreError::InvalidAppend(
                "all events in a batch must share the aggregate type".to_string(),
            ));
        }
    }

    let mut expected = first.version;
    for event in events.iter().skip(1) {
        expected = expected.next();
        if event.version != expected {
            return Err(EventStoreError::InvalidAppend(format!(
                "event versions must be sequential: expected {}, got {}",
                expected, event.version
            )));
        }
    }

    Ok(())
}
