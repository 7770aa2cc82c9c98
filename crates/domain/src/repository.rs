//! Aggregate repository: reconstitution and persistence.

use std::marker::PhantomData;

use common::AggregateId;
use event_store::{
    AppendBatch, AppendOptions, EventEnvelope, EventStore, EventStoreExt, Snapshot, Version,
};
use serde::Serialize;

use crate::aggregate::{Aggregate, DomainEvent, SnapshotCapable};
use crate::error::DomainError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    /// The new version of the aggregate after the command.
    pub new_version: Version,
}

/// Repository for loading and persisting event-sourced aggregates.
///
/// Loading follows the reconstitution algorithm: take the latest snapshot
/// (if any), replay the events strictly after it, and end up at the highest
/// replayed version with no uncommitted state. Persisting appends the new
/// events with an optimistic version check; on a conflict the caller must
/// reload and retry — the repository never retries on its own.
pub struct Repository<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    _phantom: PhantomData<A>,
}

impl<S, A> Repository<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    /// Creates a new repository backed by the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an aggregate from the event store.
    ///
    /// If the aggregate has no events, returns a default instance at
    /// version 0.
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
    {
        let (snapshot, events) = self.store.load_aggregate(aggregate_id).await?;

        let mut aggregate = if let Some(snapshot) = snapshot {
            let version = snapshot.version;
            let mut restored: A = serde_json::from_value(snapshot.state)?;
            restored.set_version(version);
            restored
        } else {
            A::default()
        };

        // Replay the delta after the snapshot. An event type the aggregate
        // enum does not know fails here instead of being skipped.
        for envelope in events {
            let event: A::Event = serde_json::from_value(envelope.payload)?;
            aggregate.apply(event);
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if it was never persisted or has
    /// been logically deleted.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
    {
        let aggregate = self.load(aggregate_id).await?;
        if aggregate.id().is_some() && !aggregate.is_deleted() {
            Ok(Some(aggregate))
        } else {
            Ok(None)
        }
    }

    /// Executes a command and persists the resulting events.
    ///
    /// The command closure receives the current aggregate state and returns
    /// either the events to apply, or an error (in which case nothing is
    /// persisted).
    #[tracing::instrument(
        skip_all,
        fields(aggregate_type = A::aggregate_type(), %aggregate_id)
    )]
    pub async fn execute<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(aggregate_id).await?;
        let current_version = aggregate.version();

        let events = command_fn(&aggregate)?;

        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                new_version: current_version,
            });
        }

        let envelopes = build_envelopes::<A>(aggregate_id, current_version, &events)?;

        let new_version = self
            .store
            .append(envelopes, AppendOptions::expect_version(current_version))
            .await?;

        for event in &events {
            aggregate.apply(event.clone());
        }
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    /// Builds the append batch for a command without persisting it.
    ///
    /// Used by the workflow orchestrator to stage one batch per touched
    /// aggregate and commit them together via `append_atomic`.
    pub fn stage(
        &self,
        aggregate: &A,
        events: &[A::Event],
    ) -> Result<AppendBatch, DomainError> {
        let aggregate_id = aggregate.id().ok_or(DomainError::AggregateNotFound {
            aggregate_type: A::aggregate_type(),
            aggregate_id: "unassigned".to_string(),
        })?;

        let current_version = aggregate.version();
        let envelopes = build_envelopes::<A>(aggregate_id, current_version, events)?;
        Ok(AppendBatch::new(envelopes, current_version))
    }
}

impl<S, A> Repository<S, A>
where
    S: EventStore,
    A: SnapshotCapable,
{
    /// Executes a command and saves a snapshot when the interval policy
    /// fires. The snapshot version never exceeds the event-store version.
    pub async fn execute_with_snapshot<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let result = self.execute(aggregate_id, command_fn).await?;

        if result.aggregate.should_snapshot() {
            let snapshot = Snapshot::from_state(
                aggregate_id,
                A::aggregate_type(),
                result.new_version,
                &result.aggregate,
            )?;
            self.store.save_snapshot(snapshot).await?;
        }

        Ok(result)
    }
}

/// Builds sequentially versioned envelopes from domain events.
fn build_envelopes<A: Aggregate>(
    aggregate_id: AggregateId,
    current_version: Version,
    events: &[A::Event],
) -> Result<Vec<EventEnvelope>, DomainError>
where
    A::Event: Serialize,
{
    let mut envelopes = Vec::with_capacity(events.len());
    let mut version = current_version;

    for event in events {
        version = version.next();
        envelopes.push(EventEnvelope::from_payload(
            aggregate_id,
            A::aggregate_type(),
            event.event_type(),
            version,
            event,
        )?);
    }

    Ok(envelopes)
}
