//! Approval workflow orchestrator.
//!
//! Coordinates submit/approve/reject/recall across every work-entry and
//! absence aggregate in a day or fiscal-month window. Each operation
//! stages one append batch per touched aggregate and commits them through
//! `append_atomic`, so a cascade either lands for every aggregate or for
//! none. Authorization and cross-aggregate checks run before any
//! aggregate is touched; optimistic-lock conflicts are returned to the
//! caller, never retried here.

use chrono::NaiveDate;
use common::AggregateId;
use domain::{
    Absence, AbsenceStatus, Aggregate, CommandResult, DomainError, DomainEvent, EntryStatus,
    FiscalMonth, Hours, MemberId, MonthlyApproval, Repository, WorkEntry,
};
use event_store::{AppendBatch, EventEnvelope, EventStore, Version};
use projections::{DailyRejectionLogView, MemberCalendarView, Projection};

use crate::commands::{
    ApproveDay, ApproveMonth, DeleteAbsence, DeleteEntry, RecallDay, RecallMonth, RecordAbsence,
    RecordEntry, RejectDay, RejectMonth, SubmitDay, SubmitMonth, UpdateAbsence, UpdateEntry,
};
use crate::config::WorkflowConfig;
use crate::error::{Result, WorkflowError};
use crate::services::audit::{AuditEntry, AuditLog};
use crate::services::org::OrgDirectory;

/// Maximum length of a rejection reason.
pub const MAX_REJECT_REASON_LEN: usize = 1000;

/// The aggregate ids touched by a cascade.
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    /// Work-entry ids transitioned by the operation.
    pub entry_ids: Vec<AggregateId>,

    /// Absence ids transitioned by the operation.
    pub absence_ids: Vec<AggregateId>,
}

/// Orchestrates the approval workflow across aggregates.
pub struct ApprovalOrchestrator<S, O, L>
where
    S: EventStore + Clone,
    O: OrgDirectory,
    L: AuditLog,
{
    store: S,
    entries: Repository<S, WorkEntry>,
    absences: Repository<S, Absence>,
    approvals: Repository<S, MonthlyApproval>,
    org: O,
    audit: L,
    calendar: MemberCalendarView,
    rejections: DailyRejectionLogView,
    config: WorkflowConfig,
}

impl<S, O, L> ApprovalOrchestrator<S, O, L>
where
    S: EventStore + Clone,
    O: OrgDirectory,
    L: AuditLog,
{
    /// Creates a new orchestrator.
    ///
    /// The calendar and rejection-log views are updated synchronously
    /// after each committed cascade; they should be the same instances the
    /// read side queries.
    pub fn new(
        store: S,
        org: O,
        audit: L,
        calendar: MemberCalendarView,
        rejections: DailyRejectionLogView,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            entries: Repository::new(store.clone()),
            absences: Repository::new(store.clone()),
            approvals: Repository::new(store.clone()),
            store,
            org,
            audit,
            calendar,
            rejections,
            config,
        }
    }

    /// Returns the calendar view backing window lookups.
    pub fn calendar(&self) -> &MemberCalendarView {
        &self.calendar
    }

    /// Returns the daily rejection log view.
    pub fn rejection_log(&self) -> &DailyRejectionLogView {
        &self.rejections
    }

    /// Loads a work entry, skipping deleted ones.
    pub async fn get_entry(&self, entry_id: AggregateId) -> Result<Option<WorkEntry>> {
        Ok(self.entries.load_existing(entry_id).await?)
    }

    /// Loads an absence, skipping deleted ones.
    pub async fn get_absence(&self, absence_id: AggregateId) -> Result<Option<Absence>> {
        Ok(self.absences.load_existing(absence_id).await?)
    }

    /// Loads the monthly approval for a member's fiscal month.
    pub async fn get_approval(
        &self,
        member_id: MemberId,
        fiscal_month: FiscalMonth,
    ) -> Result<Option<MonthlyApproval>> {
        let approval_id = MonthlyApproval::id_for(member_id, fiscal_month);
        Ok(self.approvals.load_existing(approval_id).await?)
    }
}

// Single-entry operations
impl<S, O, L> ApprovalOrchestrator<S, O, L>
where
    S: EventStore + Clone,
    O: OrgDirectory,
    L: AuditLog,
{
    /// Records a new work entry after the cross-aggregate checks pass:
    /// proxy authorization, `(member, project, date)` uniqueness, and the
    /// daily 24-hour cap.
    #[tracing::instrument(skip(self))]
    pub async fn record_entry(&self, cmd: RecordEntry) -> Result<CommandResult<WorkEntry>> {
        self.authorize_actor(cmd.entered_by, cmd.member_id).await?;

        if self
            .calendar
            .has_entry_for(cmd.member_id, cmd.project_id, cmd.work_date)
            .await
        {
            return Err(WorkflowError::DuplicateEntry {
                member_id: cmd.member_id,
                project_id: cmd.project_id,
                work_date: cmd.work_date,
            });
        }

        self.check_daily_limit(cmd.member_id, cmd.work_date, cmd.hours, None)
            .await?;

        let RecordEntry {
            entry_id,
            member_id,
            project_id,
            work_date,
            hours,
            comment,
            entered_by,
        } = cmd;

        let result = self
            .entries
            .execute_with_snapshot(entry_id, move |entry| {
                entry.record(
                    entry_id, member_id, project_id, work_date, hours, comment, entered_by,
                )
            })
            .await?;

        self.apply_result_to_views(entry_id, &result).await?;
        metrics::counter!("workflow_entries_recorded").increment(1);
        self.record_audit(
            entered_by,
            "record_entry",
            member_id,
            format!("{hours} on {work_date}"),
        )
        .await;

        Ok(result)
    }

    /// Updates an entry's hours and comment, re-checking the daily cap
    /// against every *other* entry of that member and day.
    #[tracing::instrument(skip(self))]
    pub async fn update_entry(&self, cmd: UpdateEntry) -> Result<CommandResult<WorkEntry>> {
        let entry = self
            .entries
            .load_existing(cmd.entry_id)
            .await?
            .ok_or(WorkflowError::EntryNotFound(cmd.entry_id))?;
        let member_id = entry
            .member_id()
            .ok_or(WorkflowError::EntryNotFound(cmd.entry_id))?;
        let work_date = entry
            .work_date()
            .ok_or(WorkflowError::EntryNotFound(cmd.entry_id))?;

        self.authorize_actor(cmd.updated_by, member_id).await?;
        self.check_daily_limit(member_id, work_date, cmd.hours, Some(cmd.entry_id))
            .await?;

        let UpdateEntry {
            entry_id,
            hours,
            comment,
            updated_by,
        } = cmd;

        let result = self
            .entries
            .execute_with_snapshot(entry_id, move |entry| {
                entry.update(hours, comment, updated_by)
            })
            .await?;

        self.apply_result_to_views(entry_id, &result).await?;
        self.record_audit(
            updated_by,
            "update_entry",
            member_id,
            format!("{hours} on {work_date}"),
        )
        .await;

        Ok(result)
    }

    /// Logically deletes an entry.
    #[tracing::instrument(skip(self))]
    pub async fn delete_entry(&self, cmd: DeleteEntry) -> Result<()> {
        let entry = self
            .entries
            .load_existing(cmd.entry_id)
            .await?
            .ok_or(WorkflowError::EntryNotFound(cmd.entry_id))?;
        let member_id = entry
            .member_id()
            .ok_or(WorkflowError::EntryNotFound(cmd.entry_id))?;

        self.authorize_actor(cmd.deleted_by, member_id).await?;

        let deleted_by = cmd.deleted_by;
        let result = self
            .entries
            .execute_with_snapshot(cmd.entry_id, move |entry| entry.delete(deleted_by))
            .await?;

        self.apply_result_to_views(cmd.entry_id, &result).await?;
        self.record_audit(deleted_by, "delete_entry", member_id, String::new())
            .await;

        Ok(())
    }

    /// Records a new absence after proxy authorization.
    #[tracing::instrument(skip(self))]
    pub async fn record_absence(&self, cmd: RecordAbsence) -> Result<CommandResult<Absence>> {
        self.authorize_actor(cmd.entered_by, cmd.member_id).await?;

        let RecordAbsence {
            absence_id,
            member_id,
            absence_date,
            absence_type,
            reason,
            entered_by,
        } = cmd;

        let result = self
            .absences
            .execute_with_snapshot(absence_id, move |absence| {
                absence.record(
                    absence_id,
                    member_id,
                    absence_date,
                    absence_type,
                    reason,
                    entered_by,
                )
            })
            .await?;

        self.apply_result_to_views(absence_id, &result).await?;
        metrics::counter!("workflow_absences_recorded").increment(1);
        self.record_audit(
            entered_by,
            "record_absence",
            member_id,
            format!("{absence_type} on {absence_date}"),
        )
        .await;

        Ok(result)
    }

    /// Updates an absence's type and reason; a rejected absence returns
    /// to draft.
    #[tracing::instrument(skip(self))]
    pub async fn update_absence(&self, cmd: UpdateAbsence) -> Result<CommandResult<Absence>> {
        let absence = self
            .absences
            .load_existing(cmd.absence_id)
            .await?
            .ok_or(WorkflowError::AbsenceNotFound(cmd.absence_id))?;
        let member_id = absence
            .member_id()
            .ok_or(WorkflowError::AbsenceNotFound(cmd.absence_id))?;

        self.authorize_actor(cmd.updated_by, member_id).await?;

        let UpdateAbsence {
            absence_id,
            absence_type,
            reason,
            updated_by,
        } = cmd;

        let result = self
            .absences
            .execute_with_snapshot(absence_id, move |absence| {
                absence.update(absence_type, reason, updated_by)
            })
            .await?;

        self.apply_result_to_views(absence_id, &result).await?;
        self.record_audit(
            updated_by,
            "update_absence",
            member_id,
            format!("{absence_type}"),
        )
        .await;

        Ok(result)
    }

    /// Logically deletes an absence (allowed from Draft or Rejected).
    #[tracing::instrument(skip(self))]
    pub async fn delete_absence(&self, cmd: DeleteAbsence) -> Result<()> {
        let absence = self
            .absences
            .load_existing(cmd.absence_id)
            .await?
            .ok_or(WorkflowError::AbsenceNotFound(cmd.absence_id))?;
        let member_id = absence
            .member_id()
            .ok_or(WorkflowError::AbsenceNotFound(cmd.absence_id))?;

        self.authorize_actor(cmd.deleted_by, member_id).await?;

        let deleted_by = cmd.deleted_by;
        let result = self
            .absences
            .execute_with_snapshot(cmd.absence_id, move |absence| absence.delete(deleted_by))
            .await?;

        self.apply_result_to_views(cmd.absence_id, &result).await?;
        self.record_audit(deleted_by, "delete_absence", member_id, String::new())
            .await;

        Ok(())
    }
}

// Multi-aggregate cascades
impl<S, O, L> ApprovalOrchestrator<S, O, L>
where
    S: EventStore + Clone,
    O: OrgDirectory,
    L: AuditLog,
{
    /// Submits every draft entry and absence of one day.
    #[tracing::instrument(skip(self))]
    pub async fn submit_day(&self, cmd: SubmitDay) -> Result<CascadeOutcome> {
        self.authorize_actor(cmd.submitted_by, cmd.member_id).await?;

        let (start, end) = day_window(cmd.work_date);
        let outcome = self
            .stage_submissions(cmd.member_id, start, end, cmd.submitted_by, None)
            .await?;

        metrics::counter!("workflow_day_submissions").increment(1);
        tracing::info!(
            member = %cmd.member_id,
            date = %cmd.work_date,
            entries = outcome.entry_ids.len(),
            absences = outcome.absence_ids.len(),
            "day submitted"
        );
        self.record_audit(
            cmd.submitted_by,
            "submit_day",
            cmd.member_id,
            format!(
                "{}: {} entries, {} absences",
                cmd.work_date,
                outcome.entry_ids.len(),
                outcome.absence_ids.len()
            ),
        )
        .await;

        Ok(outcome)
    }

    /// Submits every draft entry and absence of a fiscal month and records
    /// the submitted id sets on the month's approval aggregate.
    #[tracing::instrument(skip(self))]
    pub async fn submit_month(&self, cmd: SubmitMonth) -> Result<CascadeOutcome> {
        self.authorize_actor(cmd.submitted_by, cmd.member_id).await?;

        let (start, end) = cmd.fiscal_month.window(self.config.fiscal_month_start_day);
        let outcome = self
            .stage_submissions(
                cmd.member_id,
                start,
                end,
                cmd.submitted_by,
                Some(cmd.fiscal_month),
            )
            .await?;

        metrics::counter!("workflow_month_submissions").increment(1);
        tracing::info!(
            member = %cmd.member_id,
            fiscal_month = %cmd.fiscal_month,
            entries = outcome.entry_ids.len(),
            absences = outcome.absence_ids.len(),
            "month submitted"
        );
        self.record_audit(
            cmd.submitted_by,
            "submit_month",
            cmd.member_id,
            format!(
                "{}: {} entries, {} absences",
                cmd.fiscal_month,
                outcome.entry_ids.len(),
                outcome.absence_ids.len()
            ),
        )
        .await;

        Ok(outcome)
    }

    /// Approves one day's submitted set.
    #[tracing::instrument(skip(self))]
    pub async fn approve_day(&self, cmd: ApproveDay) -> Result<CascadeOutcome> {
        let (start, end) = day_window(cmd.work_date);
        let entry_ids = self
            .calendar
            .entry_ids_with_status(cmd.member_id, start, end, EntryStatus::Submitted)
            .await;
        let absence_ids = self
            .calendar
            .absence_ids_with_status(cmd.member_id, start, end, AbsenceStatus::Submitted)
            .await;

        if entry_ids.is_empty() && absence_ids.is_empty() {
            return Err(WorkflowError::NoMatchingEntries {
                member_id: cmd.member_id,
                action: "approve",
            });
        }

        let batches = self
            .stage_approvals(&entry_ids, &absence_ids, cmd.approved_by, Vec::new())
            .await?;
        self.commit(batches).await?;

        metrics::counter!("workflow_day_approvals").increment(1);
        self.record_audit(
            cmd.approved_by,
            "approve_day",
            cmd.member_id,
            format!("{}", cmd.work_date),
        )
        .await;

        Ok(CascadeOutcome {
            entry_ids,
            absence_ids,
        })
    }

    /// Approves a member's submitted fiscal month and cascades the
    /// decision to every referenced entry and absence. Terminal.
    #[tracing::instrument(skip(self))]
    pub async fn approve_month(&self, cmd: ApproveMonth) -> Result<CascadeOutcome> {
        let approval_id = MonthlyApproval::id_for(cmd.member_id, cmd.fiscal_month);
        let approval = self
            .approvals
            .load_existing(approval_id)
            .await?
            .ok_or(WorkflowError::ApprovalNotFound {
                member_id: cmd.member_id,
                fiscal_month: cmd.fiscal_month,
            })?;

        let approval_events = approval
            .approve(cmd.approved_by)
            .map_err(DomainError::from)?;
        let entry_ids = approval.entry_ids().to_vec();
        let absence_ids = approval.absence_ids().to_vec();

        let seed = vec![self.approvals.stage(&approval, &approval_events)?];
        let batches = self
            .stage_approvals(&entry_ids, &absence_ids, cmd.approved_by, seed)
            .await?;
        self.commit(batches).await?;

        metrics::counter!("workflow_month_approvals").increment(1);
        tracing::info!(member = %cmd.member_id, fiscal_month = %cmd.fiscal_month, "month approved");
        self.record_audit(
            cmd.approved_by,
            "approve_month",
            cmd.member_id,
            format!("{}", cmd.fiscal_month),
        )
        .await;

        Ok(CascadeOutcome {
            entry_ids,
            absence_ids,
        })
    }

    /// Rejects one day's submitted set back to the member and upserts the
    /// daily rejection log row.
    #[tracing::instrument(skip(self))]
    pub async fn reject_day(&self, cmd: RejectDay) -> Result<CascadeOutcome> {
        validate_reject_reason(&cmd.reason)?;

        let (start, end) = day_window(cmd.work_date);
        let entry_ids = self
            .calendar
            .entry_ids_with_status(cmd.member_id, start, end, EntryStatus::Submitted)
            .await;
        let absence_ids = self
            .calendar
            .absence_ids_with_status(cmd.member_id, start, end, AbsenceStatus::Submitted)
            .await;

        if entry_ids.is_empty() && absence_ids.is_empty() {
            return Err(WorkflowError::NoMatchingEntries {
                member_id: cmd.member_id,
                action: "reject",
            });
        }

        let batches = self
            .stage_rejections(&entry_ids, &absence_ids, cmd.rejected_by, &cmd.reason, Vec::new())
            .await?;
        self.commit(batches).await?;

        metrics::counter!("workflow_day_rejections").increment(1);
        self.record_audit(
            cmd.rejected_by,
            "reject_day",
            cmd.member_id,
            format!("{}: {}", cmd.work_date, cmd.reason),
        )
        .await;

        Ok(CascadeOutcome {
            entry_ids,
            absence_ids,
        })
    }

    /// Rejects a member's submitted fiscal month.
    #[tracing::instrument(skip(self))]
    pub async fn reject_month(&self, cmd: RejectMonth) -> Result<CascadeOutcome> {
        validate_reject_reason(&cmd.reason)?;

        let approval_id = MonthlyApproval::id_for(cmd.member_id, cmd.fiscal_month);
        let approval = self
            .approvals
            .load_existing(approval_id)
            .await?
            .ok_or(WorkflowError::ApprovalNotFound {
                member_id: cmd.member_id,
                fiscal_month: cmd.fiscal_month,
            })?;

        let approval_events = approval
            .reject(cmd.rejected_by, cmd.reason.as_str())
            .map_err(DomainError::from)?;
        let entry_ids = approval.entry_ids().to_vec();
        let absence_ids = approval.absence_ids().to_vec();

        let seed = vec![self.approvals.stage(&approval, &approval_events)?];
        let batches = self
            .stage_rejections(&entry_ids, &absence_ids, cmd.rejected_by, &cmd.reason, seed)
            .await?;
        self.commit(batches).await?;

        metrics::counter!("workflow_month_rejections").increment(1);
        tracing::info!(member = %cmd.member_id, fiscal_month = %cmd.fiscal_month, "month rejected");
        self.record_audit(
            cmd.rejected_by,
            "reject_month",
            cmd.member_id,
            format!("{}: {}", cmd.fiscal_month, cmd.reason),
        )
        .await;

        Ok(CascadeOutcome {
            entry_ids,
            absence_ids,
        })
    }

    /// Recalls the member's own submitted day back to draft. Self only.
    #[tracing::instrument(skip(self))]
    pub async fn recall_day(&self, cmd: RecallDay) -> Result<CascadeOutcome> {
        self.authorize_recall(cmd.recalled_by, cmd.member_id)?;

        let (start, end) = day_window(cmd.work_date);
        let entry_ids = self
            .calendar
            .entry_ids_with_status(cmd.member_id, start, end, EntryStatus::Submitted)
            .await;
        let absence_ids = self
            .calendar
            .absence_ids_with_status(cmd.member_id, start, end, AbsenceStatus::Submitted)
            .await;

        if entry_ids.is_empty() && absence_ids.is_empty() {
            return Err(WorkflowError::NoMatchingEntries {
                member_id: cmd.member_id,
                action: "recall",
            });
        }

        let batches = self
            .stage_recalls(&entry_ids, &absence_ids, cmd.recalled_by, Vec::new())
            .await?;
        self.commit(batches).await?;

        metrics::counter!("workflow_day_recalls").increment(1);
        self.record_audit(
            cmd.recalled_by,
            "recall_day",
            cmd.member_id,
            format!("{}", cmd.work_date),
        )
        .await;

        Ok(CascadeOutcome {
            entry_ids,
            absence_ids,
        })
    }

    /// Recalls the member's own submitted fiscal month. Self only.
    #[tracing::instrument(skip(self))]
    pub async fn recall_month(&self, cmd: RecallMonth) -> Result<CascadeOutcome> {
        self.authorize_recall(cmd.recalled_by, cmd.member_id)?;

        let approval_id = MonthlyApproval::id_for(cmd.member_id, cmd.fiscal_month);
        let approval = self
            .approvals
            .load_existing(approval_id)
            .await?
            .ok_or(WorkflowError::ApprovalNotFound {
                member_id: cmd.member_id,
                fiscal_month: cmd.fiscal_month,
            })?;

        let approval_events = approval
            .reopen(cmd.recalled_by)
            .map_err(DomainError::from)?;
        let entry_ids = approval.entry_ids().to_vec();
        let absence_ids = approval.absence_ids().to_vec();

        let seed = vec![self.approvals.stage(&approval, &approval_events)?];
        let batches = self
            .stage_recalls(&entry_ids, &absence_ids, cmd.recalled_by, seed)
            .await?;
        self.commit(batches).await?;

        metrics::counter!("workflow_month_recalls").increment(1);
        self.record_audit(
            cmd.recalled_by,
            "recall_month",
            cmd.member_id,
            format!("{}", cmd.fiscal_month),
        )
        .await;

        Ok(CascadeOutcome {
            entry_ids,
            absence_ids,
        })
    }
}

// Internal helpers
impl<S, O, L> ApprovalOrchestrator<S, O, L>
where
    S: EventStore + Clone,
    O: OrgDirectory,
    L: AuditLog,
{
    /// Verifies that `actor` may act on `member`'s records: either the
    /// member themselves, or a (possibly indirect) manager.
    async fn authorize_actor(&self, actor: MemberId, member: MemberId) -> Result<()> {
        if actor == member {
            return Ok(());
        }
        if self.org.is_manager_of(actor, member).await? {
            return Ok(());
        }
        Err(WorkflowError::ProxyEntryNotAllowed { member_id: member })
    }

    /// Recall is self-service only — never by a manager.
    fn authorize_recall(&self, actor: MemberId, member: MemberId) -> Result<()> {
        if actor == member {
            Ok(())
        } else {
            Err(WorkflowError::RecallNotAllowed { member_id: member })
        }
    }

    async fn check_daily_limit(
        &self,
        member_id: MemberId,
        work_date: NaiveDate,
        requested: Hours,
        excluded: Option<AggregateId>,
    ) -> Result<()> {
        let existing = self
            .calendar
            .total_hours_excluding(member_id, work_date, excluded)
            .await;
        if existing + requested > self.config.daily_limit {
            return Err(WorkflowError::DailyLimitExceeded {
                member_id,
                work_date,
                existing,
                requested,
            });
        }
        Ok(())
    }

    /// Finds the draft entries/absences in `[start, end)`, stages their
    /// submission (plus the monthly approval when a fiscal month is
    /// given), and commits atomically.
    async fn stage_submissions(
        &self,
        member_id: MemberId,
        start: NaiveDate,
        end: NaiveDate,
        submitted_by: MemberId,
        fiscal_month: Option<FiscalMonth>,
    ) -> Result<CascadeOutcome> {
        let entry_ids = self
            .calendar
            .entry_ids_with_status(member_id, start, end, EntryStatus::Draft)
            .await;
        let absence_ids = self
            .calendar
            .absence_ids_with_status(member_id, start, end, AbsenceStatus::Draft)
            .await;

        if entry_ids.is_empty() && absence_ids.is_empty() {
            return Err(WorkflowError::NoMatchingEntries {
                member_id,
                action: "submit",
            });
        }

        let mut batches = Vec::with_capacity(entry_ids.len() + absence_ids.len() + 1);

        for id in &entry_ids {
            let entry = self
                .entries
                .load_existing(*id)
                .await?
                .ok_or(WorkflowError::EntryNotFound(*id))?;
            let events = entry.submit(submitted_by).map_err(DomainError::from)?;
            batches.push(self.entries.stage(&entry, &events)?);
        }

        for id in &absence_ids {
            let absence = self
                .absences
                .load_existing(*id)
                .await?
                .ok_or(WorkflowError::AbsenceNotFound(*id))?;
            let events = absence.submit(submitted_by).map_err(DomainError::from)?;
            batches.push(self.absences.stage(&absence, &events)?);
        }

        if let Some(fiscal_month) = fiscal_month {
            let approval_id = MonthlyApproval::id_for(member_id, fiscal_month);
            let mut approval = self.approvals.load(approval_id).await?;
            let mut approval_events = Vec::new();

            if approval.id().is_none() {
                let opened = approval
                    .open(approval_id, member_id, fiscal_month)
                    .map_err(DomainError::from)?;
                approval.apply_events(opened.clone());
                approval_events.extend(opened);
            }

            let submitted = approval
                .submit(entry_ids.clone(), absence_ids.clone(), submitted_by)
                .map_err(DomainError::from)?;
            approval_events.extend(submitted);

            batches.push(self.approvals.stage(&approval, &approval_events)?);
        }

        self.commit(batches).await?;

        Ok(CascadeOutcome {
            entry_ids,
            absence_ids,
        })
    }

    async fn stage_approvals(
        &self,
        entry_ids: &[AggregateId],
        absence_ids: &[AggregateId],
        approved_by: MemberId,
        mut batches: Vec<AppendBatch>,
    ) -> Result<Vec<AppendBatch>> {
        for id in entry_ids {
            let entry = self
                .entries
                .load_existing(*id)
                .await?
                .ok_or(WorkflowError::EntryNotFound(*id))?;
            let events = entry.approve(approved_by).map_err(DomainError::from)?;
            batches.push(self.entries.stage(&entry, &events)?);
        }

        for id in absence_ids {
            let absence = self
                .absences
                .load_existing(*id)
                .await?
                .ok_or(WorkflowError::AbsenceNotFound(*id))?;
            let events = absence.approve(approved_by).map_err(DomainError::from)?;
            batches.push(self.absences.stage(&absence, &events)?);
        }

        Ok(batches)
    }

    async fn stage_rejections(
        &self,
        entry_ids: &[AggregateId],
        absence_ids: &[AggregateId],
        rejected_by: MemberId,
        reason: &str,
        mut batches: Vec<AppendBatch>,
    ) -> Result<Vec<AppendBatch>> {
        for id in entry_ids {
            let entry = self
                .entries
                .load_existing(*id)
                .await?
                .ok_or(WorkflowError::EntryNotFound(*id))?;
            let events = entry
                .reject(rejected_by, reason)
                .map_err(DomainError::from)?;
            batches.push(self.entries.stage(&entry, &events)?);
        }

        for id in absence_ids {
            let absence = self
                .absences
                .load_existing(*id)
                .await?
                .ok_or(WorkflowError::AbsenceNotFound(*id))?;
            let events = absence
                .reject(rejected_by, reason)
                .map_err(DomainError::from)?;
            batches.push(self.absences.stage(&absence, &events)?);
        }

        Ok(batches)
    }

    async fn stage_recalls(
        &self,
        entry_ids: &[AggregateId],
        absence_ids: &[AggregateId],
        recalled_by: MemberId,
        mut batches: Vec<AppendBatch>,
    ) -> Result<Vec<AppendBatch>> {
        for id in entry_ids {
            let entry = self
                .entries
                .load_existing(*id)
                .await?
                .ok_or(WorkflowError::EntryNotFound(*id))?;
            let events = entry.recall(recalled_by).map_err(DomainError::from)?;
            batches.push(self.entries.stage(&entry, &events)?);
        }

        for id in absence_ids {
            let absence = self
                .absences
                .load_existing(*id)
                .await?
                .ok_or(WorkflowError::AbsenceNotFound(*id))?;
            let events = absence.recall(recalled_by).map_err(DomainError::from)?;
            batches.push(self.absences.stage(&absence, &events)?);
        }

        Ok(batches)
    }

    /// Commits staged batches atomically, then folds the committed events
    /// into the read-side views.
    async fn commit(&self, batches: Vec<AppendBatch>) -> Result<()> {
        let envelopes: Vec<EventEnvelope> = batches
            .iter()
            .flat_map(|batch| batch.events.iter().cloned())
            .collect();

        self.store.append_atomic(batches).await?;
        self.apply_to_views(&envelopes).await
    }

    async fn apply_to_views(&self, envelopes: &[EventEnvelope]) -> Result<()> {
        for envelope in envelopes {
            self.calendar.handle(envelope).await?;
            self.rejections.handle(envelope).await?;
        }
        Ok(())
    }

    /// Rebuilds the envelopes of a repository command result so the views
    /// see the same events that were just persisted.
    async fn apply_result_to_views<A: Aggregate>(
        &self,
        aggregate_id: AggregateId,
        result: &CommandResult<A>,
    ) -> Result<()> {
        let start = result.new_version.as_i64() - result.events.len() as i64;
        let mut version = Version::new(start);
        let mut envelopes = Vec::with_capacity(result.events.len());

        for event in &result.events {
            version = version.next();
            envelopes.push(EventEnvelope::from_payload(
                aggregate_id,
                A::aggregate_type(),
                event.event_type(),
                version,
                event,
            )?);
        }

        self.apply_to_views(&envelopes).await
    }

    /// Audit runs after and independent of the primary commit; a failure
    /// here never rolls the business operation back.
    async fn record_audit(
        &self,
        actor: MemberId,
        action: &'static str,
        member_id: MemberId,
        detail: String,
    ) {
        let entry = AuditEntry::new(actor, action, member_id, detail);
        if let Err(e) = self.audit.record(entry).await {
            metrics::counter!("workflow_audit_failures").increment(1);
            tracing::warn!(error = %e, action, "audit write failed; continuing");
        }
    }
}

fn day_window(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    (date, date.succ_opt().unwrap_or(NaiveDate::MAX))
}

fn validate_reject_reason(reason: &str) -> Result<()> {
    if reason.trim().is_empty() {
        return Err(WorkflowError::ReasonRequired);
    }
    let length = reason.chars().count();
    if length > MAX_REJECT_REASON_LEN {
        return Err(WorkflowError::ReasonTooLong {
            length,
            max: MAX_REJECT_REASON_LEN,
        });
    }
    Ok(())
}
