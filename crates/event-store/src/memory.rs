use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventStoreError, Result, Snapshot, Version,
    store::{AppendBatch, AppendOptions, EventStore, EventStream, validate_append},
};

/// In-memory event store used by unit and workflow tests.
///
/// Provides the same contract as the PostgreSQL implementation, including
/// the multi-aggregate atomic append: all batches are checked under one
/// write lock before anything is inserted.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
    snapshots: Arc<RwLock<HashMap<AggregateId, Snapshot>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Clears all events and snapshots.
    pub async fn clear(&self) {
        self.events.write().await.clear();
        self.snapshots.write().await.clear();
    }

    fn version_in(log: &[EventEnvelope], aggregate_id: AggregateId) -> Version {
        log.iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max()
            .unwrap_or(Version::initial())
    }

    /// Checks one batch against the current log without inserting.
    fn check_batch(log: &[EventEnvelope], batch: &AppendBatch) -> Result<()> {
        validate_append(&batch.events)?;

        let first = &batch.events[0];
        let current = Self::version_in(log, first.aggregate_id);

        if let Some(expected) = batch.options.expected_version
            && current != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id: first.aggregate_id,
                expected,
                actual: current,
            });
        }

        // Mirrors the unique (aggregate_id, version) constraint.
        if first.version != current.next() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id: first.aggregate_id,
                expected: batch.options.expected_version.unwrap_or(current),
                actual: current,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        let mut log = self.events.write().await;

        let batch = AppendBatch { events, options };
        Self::check_batch(&log, &batch)?;

        let last_version = batch
            .events
            .last()
            .map(|e| e.version)
            .unwrap_or(Version::initial());
        log.extend(batch.events);

        Ok(last_version)
    }

    async fn append_atomic(&self, batches: Vec<AppendBatch>) -> Result<()> {
        let mut log = self.events.write().await;

        // Every batch must pass before any event is inserted.
        for batch in &batches {
            Self::check_batch(&log, batch)?;
        }

        for batch in batches {
            log.extend(batch.events);
        }

        Ok(())
    }

    async fn events_for_aggregate(&self, aggregate_id: AggregateId) -> Result<Vec<EventEnvelope>> {
        let log = self.events.read().await;
        let mut events: Vec<_> = log
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn events_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let log = self.events.read().await;
        let mut events: Vec<_> = log
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id && e.version >= from_version)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn stream_all(&self) -> Result<EventStream> {
        use futures_util::stream;

        let log = self.events.read().await;
        let events = log.clone();

        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn current_version(&self, aggregate_id: AggregateId) -> Result<Version> {
        let log = self.events.read().await;
        Ok(Self::version_in(&log, aggregate_id))
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.aggregate_id, snapshot);
        Ok(())
    }

    async fn snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.get(&aggregate_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_event(aggregate_id: AggregateId, version: Version, event_type: &str) -> EventEnvelope {
        EventEnvelope::new(
            aggregate_id,
            "WorkEntry",
            event_type,
            version,
            serde_json::json!({"test": true}),
        )
    }

    #[tokio::test]
    async fn append_single_event() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();
        let event = test_event(aggregate_id, Version::first(), "EntryRecorded");

        let result = store.append(vec![event], AppendOptions::expect_new()).await;
        assert_eq!(result.unwrap(), Version::first());

        let events = store.events_for_aggregate(aggregate_id).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn append_multiple_events() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let events = vec![
            test_event(aggregate_id, Version::new(1), "EntryRecorded"),
            test_event(aggregate_id, Version::new(2), "EntryUpdated"),
            test_event(aggregate_id, Version::new(3), "EntrySubmitted"),
        ];

        let result = store.append(events, AppendOptions::expect_new()).await;
        assert_eq!(result.unwrap(), Version::new(3));

        let stored = store.events_for_aggregate(aggregate_id).await.unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn concurrency_conflict_on_wrong_version() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let event1 = test_event(aggregate_id, Version::first(), "EntryRecorded");
        store
            .append(vec![event1], AppendOptions::expect_new())
            .await
            .unwrap();

        // Stale expectation: the aggregate is at version 1, not 0.
        let event2 = test_event(aggregate_id, Version::first(), "EntryUpdated");
        let result = store
            .append(vec![event2], AppendOptions::expect_new())
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_appends_have_exactly_one_winner() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        store
            .append(
                vec![test_event(aggregate_id, Version::first(), "EntryRecorded")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        // Two writers both observed version 1 and race to append version 2.
        let a = store
            .append(
                vec![test_event(aggregate_id, Version::new(2), "EntryUpdated")],
                AppendOptions::expect_version(Version::first()),
            )
            .await;
        let b = store
            .append(
                vec![test_event(aggregate_id, Version::new(2), "EntryUpdated")],
                AppendOptions::expect_version(Version::first()),
            )
            .await;

        assert!(a.is_ok());
        assert!(matches!(
            b,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
        assert_eq!(
            store.current_version(aggregate_id).await.unwrap(),
            Version::new(2)
        );
    }

    #[tokio::test]
    async fn append_atomic_commits_all_batches() {
        let store = InMemoryEventStore::new();
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();

        let batches = vec![
            AppendBatch::new(
                vec![test_event(id1, Version::first(), "EntrySubmitted")],
                Version::initial(),
            ),
            AppendBatch::new(
                vec![test_event(id2, Version::first(), "EntrySubmitted")],
                Version::initial(),
            ),
        ];

        store.append_atomic(batches).await.unwrap();

        assert_eq!(store.current_version(id1).await.unwrap(), Version::first());
        assert_eq!(store.current_version(id2).await.unwrap(), Version::first());
    }

    #[tokio::test]
    async fn append_atomic_rejects_everything_on_one_stale_batch() {
        let store = InMemoryEventStore::new();
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();
        let id3 = AggregateId::new();

        // id2 already has one event, so an expect_new batch for it is stale.
        store
            .append(
                vec![test_event(id2, Version::first(), "EntryRecorded")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        let batches = vec![
            AppendBatch::new(
                vec![test_event(id1, Version::first(), "EntrySubmitted")],
                Version::initial(),
            ),
            AppendBatch::new(
                vec![test_event(id2, Version::first(), "EntrySubmitted")],
                Version::initial(),
            ),
            AppendBatch::new(
                vec![test_event(id3, Version::first(), "EntrySubmitted")],
                Version::initial(),
            ),
        ];

        let result = store.append_atomic(batches).await;
        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));

        // Nothing was committed for the other aggregates.
        assert_eq!(
            store.current_version(id1).await.unwrap(),
            Version::initial()
        );
        assert_eq!(store.current_version(id2).await.unwrap(), Version::first());
        assert_eq!(
            store.current_version(id3).await.unwrap(),
            Version::initial()
        );
    }

    #[tokio::test]
    async fn events_from_version_returns_delta() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let events = vec![
            test_event(aggregate_id, Version::new(1), "EntryRecorded"),
            test_event(aggregate_id, Version::new(2), "EntryUpdated"),
            test_event(aggregate_id, Version::new(3), "EntrySubmitted"),
        ];
        store.append(events, AppendOptions::new()).await.unwrap();

        let from_v2 = store
            .events_from_version(aggregate_id, Version::new(2))
            .await
            .unwrap();
        assert_eq!(from_v2.len(), 2);
        assert_eq!(from_v2[0].version, Version::new(2));
        assert_eq!(from_v2[1].version, Version::new(3));
    }

    #[tokio::test]
    async fn current_version_is_zero_for_unknown_aggregate() {
        let store = InMemoryEventStore::new();
        let version = store.current_version(AggregateId::new()).await.unwrap();
        assert_eq!(version, Version::initial());
    }

    #[tokio::test]
    async fn snapshot_upsert_keeps_latest_only() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let first = Snapshot::new(
            aggregate_id,
            "WorkEntry",
            Version::new(5),
            serde_json::json!({"status": "Draft"}),
        );
        store.save_snapshot(first).await.unwrap();

        let second = Snapshot::new(
            aggregate_id,
            "WorkEntry",
            Version::new(9),
            serde_json::json!({"status": "Submitted"}),
        );
        store.save_snapshot(second).await.unwrap();

        let loaded = store.snapshot(aggregate_id).await.unwrap().unwrap();
        assert_eq!(loaded.version, Version::new(9));
    }

    #[tokio::test]
    async fn snapshot_not_found() {
        let store = InMemoryEventStore::new();
        let result = store.snapshot(AggregateId::new()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn stream_all_yields_insertion_order() {
        use futures_util::StreamExt;

        let store = InMemoryEventStore::new();
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();

        store
            .append(
                vec![test_event(id1, Version::first(), "EntryRecorded")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![test_event(id2, Version::first(), "AbsenceRecorded")],
                AppendOptions::new(),
            )
            .await
            .unwrap();

        let stream = store.stream_all().await.unwrap();
        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap().aggregate_id, id1);
        assert_eq!(events[1].as_ref().unwrap().aggregate_id, id2);
    }
}
