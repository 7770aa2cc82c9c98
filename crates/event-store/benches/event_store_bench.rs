use common::AggregateId;
use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{
    AppendBatch, AppendOptions, EventEnvelope, InMemoryEventStore, Version, store::EventStore,
};

fn make_event(aggregate_id: AggregateId, version: i64) -> EventEnvelope {
    EventEnvelope::new(
        aggregate_id,
        "WorkEntry",
        "EntryRecorded",
        Version::new(version),
        serde_json::json!({
            "type": "EntryRecorded",
            "data": {
                "entry_id": aggregate_id.to_string(),
                "member_id": "00000000-0000-0000-0000-000000000001",
                "hours": 32
            }
        }),
    )
}

fn bench_append_single_event(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_single_event", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let agg_id = AggregateId::new();
                let event = make_event(agg_id, 1);
                store
                    .append(vec![event], AppendOptions::expect_new())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_append_batch_10(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_batch_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let agg_id = AggregateId::new();
                let events: Vec<EventEnvelope> = (1..=10).map(|v| make_event(agg_id, v)).collect();
                store
                    .append(events, AppendOptions::expect_new())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_append_atomic_10_aggregates(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_atomic_10_aggregates", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let batches: Vec<AppendBatch> = (0..10)
                    .map(|_| {
                        let agg_id = AggregateId::new();
                        AppendBatch::new(vec![make_event(agg_id, 1)], Version::initial())
                    })
                    .collect();
                store.append_atomic(batches).await.unwrap();
            });
        });
    });
}

fn bench_load_100_events(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/load_100_events", |b| {
        let store = InMemoryEventStore::new();
        let agg_id = AggregateId::new();
        rt.block_on(async {
            let events: Vec<EventEnvelope> = (1..=100).map(|v| make_event(agg_id, v)).collect();
            store
                .append(events, AppendOptions::expect_new())
                .await
                .unwrap();
        });

        b.iter(|| {
            rt.block_on(async {
                let events = store.events_for_aggregate(agg_id).await.unwrap();
                assert_eq!(events.len(), 100);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_append_single_event,
    bench_append_batch_10,
    bench_append_atomic_10_aggregates,
    bench_load_100_events
);
criterion_main!(benches);
