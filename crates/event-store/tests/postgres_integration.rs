//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p event-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use event_store::{
    AggregateId, AppendBatch, AppendOptions, EventEnvelope, EventStore, EventStoreError,
    PostgresEventStore, Snapshot, Version,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            // Run migrations using raw_sql to execute multiple statements
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_events_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresEventStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query("TRUNCATE TABLE events, snapshots")
        .execute(&pool)
        .await
        .unwrap();

    PostgresEventStore::new(pool)
}

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
async fn append_and_retrieve_events() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let event = test_event(aggregate_id, Version::first(), "EntryRecorded");
    let result = store.append(vec![event], AppendOptions::expect_new()).await;
    assert_eq!(result.unwrap(), Version::first());

    let events = store.events_for_aggregate(aggregate_id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "EntryRecorded");
    assert_eq!(events[0].version, Version::first());
}

#[tokio::test]
async fn append_batch_is_atomic() {
    let store = get_test_store().await;
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
    assert_eq!(stored[2].event_type, "EntrySubmitted");
}

#[tokio::test]
async fn concurrency_conflict_on_stale_version() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    store
        .append(
            vec![test_event(aggregate_id, Version::first(), "EntryRecorded")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    // A second writer that still believes the aggregate is new.
    let result = store
        .append(
            vec![test_event(aggregate_id, Version::first(), "EntryUpdated")],
            AppendOptions::expect_new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
    assert_eq!(
        store.current_version(aggregate_id).await.unwrap(),
        Version::first()
    );
}

#[tokio::test]
async fn append_atomic_commits_all_or_nothing() {
    let store = get_test_store().await;
    let id1 = AggregateId::new();
    let id2 = AggregateId::new();
    let id3 = AggregateId::new();

    // Seed id2 so its expect_new batch below is stale.
    store
        .append(
            vec![test_event(id2, Version::first(), "EntryRecorded")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    let stale = vec![
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

    let result = store.append_atomic(stale).await;
    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));

    // The transaction rolled back: id1 and id3 stayed untouched.
    assert_eq!(store.current_version(id1).await.unwrap(), Version::initial());
    assert_eq!(store.current_version(id3).await.unwrap(), Version::initial());

    // A consistent batch set commits everywhere.
    let fresh = vec![
        AppendBatch::new(
            vec![test_event(id1, Version::first(), "EntrySubmitted")],
            Version::initial(),
        ),
        AppendBatch::new(
            vec![test_event(id2, Version::new(2), "EntrySubmitted")],
            Version::first(),
        ),
        AppendBatch::new(
            vec![test_event(id3, Version::first(), "EntrySubmitted")],
            Version::initial(),
        ),
    ];
    store.append_atomic(fresh).await.unwrap();

    assert_eq!(store.current_version(id1).await.unwrap(), Version::first());
    assert_eq!(store.current_version(id2).await.unwrap(), Version::new(2));
    assert_eq!(store.current_version(id3).await.unwrap(), Version::first());
}

#[tokio::test]
async fn events_from_version_returns_the_delta() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    let events = vec![
        test_event(aggregate_id, Version::new(1), "EntryRecorded"),
        test_event(aggregate_id, Version::new(2), "EntryUpdated"),
        test_event(aggregate_id, Version::new(3), "EntrySubmitted"),
    ];
    store.append(events, AppendOptions::expect_new()).await.unwrap();

    let delta = store
        .events_from_version(aggregate_id, Version::new(2))
        .await
        .unwrap();
    assert_eq!(delta.len(), 2);
    assert_eq!(delta[0].version, Version::new(2));
    assert_eq!(delta[1].version, Version::new(3));
}

#[tokio::test]
async fn current_version_is_zero_for_unknown_aggregate() {
    let store = get_test_store().await;
    let version = store.current_version(AggregateId::new()).await.unwrap();
    assert_eq!(version, Version::initial());
}

#[tokio::test]
async fn snapshot_upsert_keeps_only_the_latest() {
    let store = get_test_store().await;
    let aggregate_id = AggregateId::new();

    store
        .save_snapshot(Snapshot::new(
            aggregate_id,
            "WorkEntry",
            Version::new(5),
            serde_json::json!({"status": "Draft"}),
        ))
        .await
        .unwrap();
    store
        .save_snapshot(Snapshot::new(
            aggregate_id,
            "WorkEntry",
            Version::new(9),
            serde_json::json!({"status": "Submitted"}),
        ))
        .await
        .unwrap();

    let snapshot = store.snapshot(aggregate_id).await.unwrap().unwrap();
    assert_eq!(snapshot.version, Version::new(9));
    assert_eq!(snapshot.state["status"], "Submitted");
}

#[tokio::test]
async fn stream_all_yields_every_event() {
    use futures_util::StreamExt;

    let store = get_test_store().await;
    let id1 = AggregateId::new();
    let id2 = AggregateId::new();

    store
        .append(
            vec![test_event(id1, Version::first(), "EntryRecorded")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();
    store
        .append(
            vec![test_event(id2, Version::first(), "AbsenceRecorded")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    let stream = store.stream_all().await.unwrap();
    let events: Vec<_> = stream.collect().await;
    assert_eq!(events.len(), 2);
}
