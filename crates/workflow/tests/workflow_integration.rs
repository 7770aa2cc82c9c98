//! End-to-end workflow scenarios over the in-memory event store.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use common::AggregateId;
use domain::{
    AbsenceStatus, AbsenceType, Aggregate, ApprovalStatus, EntryStatus, FiscalMonth, Hours,
    MemberId, ProjectId,
};
use event_store::{
    AppendBatch, AppendOptions, EventEnvelope, EventStore, EventStoreError, EventStream,
    InMemoryEventStore, Snapshot, Version,
};
use projections::{DailyRejectionLogView, MemberCalendarView};
use workflow::{
    ApprovalOrchestrator, ApproveDay, ApproveMonth, InMemoryAuditLog, InMemoryOrgDirectory,
    RecallDay, RecallMonth, RecordAbsence, RecordEntry, RejectDay, SubmitDay, SubmitMonth,
    UpdateEntry, WorkflowConfig, WorkflowError,
};

/// Event store wrapper that injects a concurrency conflict whenever an
/// atomic append touches a chosen aggregate. Used to prove that a cascade
/// failing partway leaves every aggregate untouched.
#[derive(Clone)]
struct ConflictInjectingStore {
    inner: InMemoryEventStore,
    conflict_on: Arc<RwLock<Option<AggregateId>>>,
}

impl ConflictInjectingStore {
    fn new(inner: InMemoryEventStore) -> Self {
        Self {
            inner,
            conflict_on: Arc::new(RwLock::new(None)),
        }
    }

    fn set_conflict_on(&self, aggregate_id: Option<AggregateId>) {
        *self.conflict_on.write().unwrap() = aggregate_id;
    }
}

#[async_trait]
impl EventStore for ConflictInjectingStore {
    async fn append(
        &self,
        events: Vec<EventEnvelope>,
        options: AppendOptions,
    ) -> event_store::Result<Version> {
        self.inner.append(events, options).await
    }

    async fn append_atomic(&self, batches: Vec<AppendBatch>) -> event_store::Result<()> {
        let trigger = *self.conflict_on.read().unwrap();
        if let Some(target) = trigger
            && let Some(batch) = batches
                .iter()
                .find(|b| b.events.first().map(|e| e.aggregate_id) == Some(target))
        {
            let expected = batch
                .options
                .expected_version
                .unwrap_or(Version::initial());
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id: target,
                expected,
                actual: expected.next(),
            });
        }
        self.inner.append_atomic(batches).await
    }

    async fn events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> event_store::Result<Vec<EventEnvelope>> {
        self.inner.events_for_aggregate(aggregate_id).await
    }

    async fn events_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> event_store::Result<Vec<EventEnvelope>> {
        self.inner
            .events_from_version(aggregate_id, from_version)
            .await
    }

    async fn stream_all(&self) -> event_store::Result<EventStream> {
        self.inner.stream_all().await
    }

    async fn current_version(&self, aggregate_id: AggregateId) -> event_store::Result<Version> {
        self.inner.current_version(aggregate_id).await
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> event_store::Result<()> {
        self.inner.save_snapshot(snapshot).await
    }

    async fn snapshot(&self, aggregate_id: AggregateId) -> event_store::Result<Option<Snapshot>> {
        self.inner.snapshot(aggregate_id).await
    }
}

type TestOrchestrator =
    ApprovalOrchestrator<ConflictInjectingStore, InMemoryOrgDirectory, InMemoryAuditLog>;

struct Harness {
    orchestrator: TestOrchestrator,
    store: ConflictInjectingStore,
    org: InMemoryOrgDirectory,
    audit: InMemoryAuditLog,
}

fn setup() -> Harness {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let store = ConflictInjectingStore::new(InMemoryEventStore::new());
    let org = InMemoryOrgDirectory::new();
    let audit = InMemoryAuditLog::new();
    let orchestrator = ApprovalOrchestrator::new(
        store.clone(),
        org.clone(),
        audit.clone(),
        MemberCalendarView::new(),
        DailyRejectionLogView::new(),
        WorkflowConfig::default(),
    );

    Harness {
        orchestrator,
        store,
        org,
        audit,
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

async fn record_hours(
    harness: &Harness,
    member: MemberId,
    work_date: NaiveDate,
    hours: Hours,
) -> AggregateId {
    let result = harness
        .orchestrator
        .record_entry(RecordEntry::new(
            member,
            ProjectId::new(),
            work_date,
            hours,
            member,
        ))
        .await
        .unwrap();
    result.aggregate.id().unwrap()
}

#[tokio::test]
async fn entry_lifecycle_submit_approve_then_update_fails() {
    let harness = setup();
    let member = MemberId::new();
    let reviewer = MemberId::new();

    let entry_id = record_hours(&harness, member, date(), Hours::from_hours(8)).await;
    let entry = harness.orchestrator.get_entry(entry_id).await.unwrap().unwrap();
    assert_eq!(entry.status(), EntryStatus::Draft);

    harness
        .orchestrator
        .submit_day(SubmitDay::new(member, date(), member))
        .await
        .unwrap();
    let entry = harness.orchestrator.get_entry(entry_id).await.unwrap().unwrap();
    assert_eq!(entry.status(), EntryStatus::Submitted);

    harness
        .orchestrator
        .approve_day(ApproveDay::new(member, date(), reviewer))
        .await
        .unwrap();
    let entry = harness.orchestrator.get_entry(entry_id).await.unwrap().unwrap();
    assert_eq!(entry.status(), EntryStatus::Approved);

    let result = harness
        .orchestrator
        .update_entry(UpdateEntry::new(entry_id, Hours::from_hours(4), member))
        .await;
    match result {
        Err(err) => assert_eq!(err.code(), "NOT_EDITABLE"),
        Ok(_) => panic!("approved entry must be immutable"),
    }
}

#[tokio::test]
async fn cascade_atomicity_no_partial_submitted_set() {
    let harness = setup();
    let member = MemberId::new();

    let e1 = record_hours(&harness, member, date(), Hours::from_hours(4)).await;
    let e2 = record_hours(&harness, member, date(), Hours::from_hours(4)).await;
    let e3 = record_hours(&harness, member, date(), Hours::from_hours(4)).await;

    // The middle entry's batch fails its optimistic check.
    harness.store.set_conflict_on(Some(e2));

    let result = harness
        .orchestrator
        .submit_day(SubmitDay::new(member, date(), member))
        .await;
    assert!(matches!(
        result,
        Err(WorkflowError::EventStore(
            EventStoreError::ConcurrencyConflict { .. }
        ))
    ));

    // No mixed-status set: every entry is still Draft.
    for id in [e1, e2, e3] {
        let entry = harness.orchestrator.get_entry(id).await.unwrap().unwrap();
        assert_eq!(entry.status(), EntryStatus::Draft);
    }

    // Clearing the fault lets the whole day go through.
    harness.store.set_conflict_on(None);
    let outcome = harness
        .orchestrator
        .submit_day(SubmitDay::new(member, date(), member))
        .await
        .unwrap();
    assert_eq!(outcome.entry_ids.len(), 3);

    for id in [e1, e2, e3] {
        let entry = harness.orchestrator.get_entry(id).await.unwrap().unwrap();
        assert_eq!(entry.status(), EntryStatus::Submitted);
    }
}

#[tokio::test]
async fn proxy_submit_by_manager_and_stranger() {
    let harness = setup();
    let member = MemberId::new();
    let manager = MemberId::new();
    let stranger = MemberId::new();
    harness.org.set_manager(member, manager);

    record_hours(&harness, member, date(), Hours::from_hours(8)).await;

    // A non-manager is rejected, and the message names the member.
    let result = harness
        .orchestrator
        .submit_day(SubmitDay::new(member, date(), stranger))
        .await;
    match result {
        Err(err @ WorkflowError::ProxyEntryNotAllowed { .. }) => {
            assert_eq!(err.code(), "PROXY_ENTRY_NOT_ALLOWED");
            assert!(err.to_string().contains(&member.to_string()));
        }
        other => panic!("expected proxy rejection, got {other:?}"),
    }

    // The manager may submit on the member's behalf.
    harness
        .orchestrator
        .submit_day(SubmitDay::new(member, date(), manager))
        .await
        .unwrap();
}

#[tokio::test]
async fn monthly_submission_approval_roundtrip() {
    let harness = setup();
    let member = MemberId::new();
    let reviewer = MemberId::new();
    let fiscal_month = FiscalMonth::new(2026, 1);

    let d1 = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();
    let d2 = NaiveDate::from_ymd_opt(2026, 1, 13).unwrap();

    let e1 = record_hours(&harness, member, d1, Hours::from_hours(8)).await;
    let e2 = record_hours(&harness, member, d2, Hours::from_hours(8)).await;

    let absence = harness
        .orchestrator
        .record_absence(
            RecordAbsence::new(member, d2, AbsenceType::PaidLeave, member)
                .with_reason("half-day leave"),
        )
        .await
        .unwrap();
    let a1 = absence.aggregate.id().unwrap();

    let outcome = harness
        .orchestrator
        .submit_month(SubmitMonth::new(member, fiscal_month, member))
        .await
        .unwrap();
    assert_eq!(outcome.entry_ids.len(), 2);
    assert_eq!(outcome.absence_ids.len(), 1);

    let approval = harness
        .orchestrator
        .get_approval(member, fiscal_month)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(approval.status(), ApprovalStatus::Submitted);
    assert_eq!(approval.entry_ids().len(), 2);
    assert_eq!(approval.absence_ids(), &[a1]);

    harness
        .orchestrator
        .approve_month(ApproveMonth::new(member, fiscal_month, reviewer))
        .await
        .unwrap();

    let approval = harness
        .orchestrator
        .get_approval(member, fiscal_month)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(approval.status(), ApprovalStatus::Approved);
    assert_eq!(approval.decided_by(), Some(reviewer));

    for id in [e1, e2] {
        let entry = harness.orchestrator.get_entry(id).await.unwrap().unwrap();
        assert_eq!(entry.status(), EntryStatus::Approved);
    }
    let absence = harness.orchestrator.get_absence(a1).await.unwrap().unwrap();
    assert_eq!(absence.status(), AbsenceStatus::Approved);
}

#[tokio::test]
async fn rejecting_a_day_twice_keeps_one_row_with_the_second_reason() {
    let harness = setup();
    let member = MemberId::new();
    let reviewer = MemberId::new();

    let entry_id = record_hours(&harness, member, date(), Hours::from_hours(8)).await;

    harness
        .orchestrator
        .submit_day(SubmitDay::new(member, date(), member))
        .await
        .unwrap();
    harness
        .orchestrator
        .reject_day(RejectDay::new(member, date(), reviewer, "wrong project"))
        .await
        .unwrap();

    // The entry is editable again and the log row carries the reason.
    let entry = harness.orchestrator.get_entry(entry_id).await.unwrap().unwrap();
    assert_eq!(entry.status(), EntryStatus::Draft);
    let row = harness
        .orchestrator
        .rejection_log()
        .rejection_for(member, date())
        .await
        .unwrap();
    assert_eq!(row.reason, "wrong project");
    assert_eq!(row.entry_ids, vec![entry_id]);

    // Resubmit and reject again with a different reason.
    harness
        .orchestrator
        .submit_day(SubmitDay::new(member, date(), member))
        .await
        .unwrap();
    harness
        .orchestrator
        .reject_day(RejectDay::new(member, date(), reviewer, "hours look wrong"))
        .await
        .unwrap();

    assert_eq!(harness.orchestrator.rejection_log().row_count().await, 1);
    let row = harness
        .orchestrator
        .rejection_log()
        .rejection_for(member, date())
        .await
        .unwrap();
    assert_eq!(row.reason, "hours look wrong");
    assert_eq!(row.entry_ids, vec![entry_id]);
}

#[tokio::test]
async fn rejected_absence_lands_in_rejected_not_draft() {
    let harness = setup();
    let member = MemberId::new();
    let reviewer = MemberId::new();

    let absence = harness
        .orchestrator
        .record_absence(RecordAbsence::new(
            member,
            date(),
            AbsenceType::SickLeave,
            member,
        ))
        .await
        .unwrap();
    let absence_id = absence.aggregate.id().unwrap();

    harness
        .orchestrator
        .submit_day(SubmitDay::new(member, date(), member))
        .await
        .unwrap();
    harness
        .orchestrator
        .reject_day(RejectDay::new(member, date(), reviewer, "needs a doctor's note"))
        .await
        .unwrap();

    let absence = harness
        .orchestrator
        .get_absence(absence_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(absence.status(), AbsenceStatus::Rejected);

    let row = harness
        .orchestrator
        .rejection_log()
        .rejection_for(member, date())
        .await
        .unwrap();
    assert_eq!(row.absence_ids, vec![absence_id]);
}

#[tokio::test]
async fn recall_is_self_service_only() {
    let harness = setup();
    let member = MemberId::new();
    let manager = MemberId::new();
    harness.org.set_manager(member, manager);

    let entry_id = record_hours(&harness, member, date(), Hours::from_hours(8)).await;
    harness
        .orchestrator
        .submit_day(SubmitDay::new(member, date(), member))
        .await
        .unwrap();

    // Even the manager may not recall on the member's behalf.
    let result = harness
        .orchestrator
        .recall_day(RecallDay::new(member, date(), manager))
        .await;
    assert!(matches!(result, Err(WorkflowError::RecallNotAllowed { .. })));

    harness
        .orchestrator
        .recall_day(RecallDay::new(member, date(), member))
        .await
        .unwrap();
    let entry = harness.orchestrator.get_entry(entry_id).await.unwrap().unwrap();
    assert_eq!(entry.status(), EntryStatus::Draft);
}

#[tokio::test]
async fn recall_month_reopens_the_approval() {
    let harness = setup();
    let member = MemberId::new();
    let fiscal_month = FiscalMonth::new(2026, 1);
    let work_date = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();

    let entry_id = record_hours(&harness, member, work_date, Hours::from_hours(8)).await;
    harness
        .orchestrator
        .submit_month(SubmitMonth::new(member, fiscal_month, member))
        .await
        .unwrap();

    harness
        .orchestrator
        .recall_month(RecallMonth::new(member, fiscal_month, member))
        .await
        .unwrap();

    let approval = harness
        .orchestrator
        .get_approval(member, fiscal_month)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(approval.status(), ApprovalStatus::Pending);

    let entry = harness.orchestrator.get_entry(entry_id).await.unwrap().unwrap();
    assert_eq!(entry.status(), EntryStatus::Draft);

    // The recalled month can be submitted again.
    harness
        .orchestrator
        .submit_month(SubmitMonth::new(member, fiscal_month, member))
        .await
        .unwrap();
}

#[tokio::test]
async fn rejected_month_can_be_resubmitted() {
    let harness = setup();
    let member = MemberId::new();
    let reviewer = MemberId::new();
    let fiscal_month = FiscalMonth::new(2026, 1);
    let work_date = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();

    record_hours(&harness, member, work_date, Hours::from_hours(8)).await;
    harness
        .orchestrator
        .submit_month(SubmitMonth::new(member, fiscal_month, member))
        .await
        .unwrap();
    harness
        .orchestrator
        .reject_month(workflow::RejectMonth::new(
            member,
            fiscal_month,
            reviewer,
            "missing the 13th",
        ))
        .await
        .unwrap();

    let approval = harness
        .orchestrator
        .get_approval(member, fiscal_month)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(approval.status(), ApprovalStatus::Rejected);
    assert_eq!(approval.rejection_reason(), Some("missing the 13th"));

    harness
        .orchestrator
        .submit_month(SubmitMonth::new(member, fiscal_month, member))
        .await
        .unwrap();

    let approval = harness
        .orchestrator
        .get_approval(member, fiscal_month)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(approval.status(), ApprovalStatus::Submitted);
}

#[tokio::test]
async fn deleted_entries_are_invisible_to_submission() {
    let harness = setup();
    let member = MemberId::new();

    let entry_id = record_hours(&harness, member, date(), Hours::from_hours(8)).await;
    harness
        .orchestrator
        .delete_entry(workflow::DeleteEntry::new(entry_id, member))
        .await
        .unwrap();

    assert!(harness.orchestrator.get_entry(entry_id).await.unwrap().is_none());

    let result = harness
        .orchestrator
        .submit_day(SubmitDay::new(member, date(), member))
        .await;
    assert!(matches!(
        result,
        Err(WorkflowError::NoMatchingEntries { .. })
    ));

    // The freed hours can be booked again on the same project/day.
    assert_eq!(
        harness.orchestrator.calendar().total_hours(member, date()).await,
        Hours::zero()
    );
}

#[tokio::test]
async fn audit_trail_covers_the_whole_flow() {
    let harness = setup();
    let member = MemberId::new();
    let reviewer = MemberId::new();

    record_hours(&harness, member, date(), Hours::from_hours(8)).await;
    harness
        .orchestrator
        .submit_day(SubmitDay::new(member, date(), member))
        .await
        .unwrap();
    harness
        .orchestrator
        .approve_day(ApproveDay::new(member, date(), reviewer))
        .await
        .unwrap();

    let actions: Vec<String> = harness
        .audit
        .entries()
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(actions, vec!["record_entry", "submit_day", "approve_day"]);
}
