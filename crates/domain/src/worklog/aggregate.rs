//! Work-log entry aggregate.

use chrono::{NaiveDate, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::values::{Hours, MemberId, ProjectId};

use super::{
    EntryStatus, MAX_COMMENT_LEN, WorkEntryError, WorkEntryEvent,
    events::{EntryRecordedData, EntryUpdatedData},
};

/// Work-log entry aggregate root.
///
/// One entry records the hours a member worked on one project on one day.
/// State is always a fold of `apply` over the event history; command
/// methods validate and return events without mutating.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkEntry {
    /// Unique entry identifier.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// The member the entry is attributed to.
    member_id: Option<MemberId>,

    /// The project hours are booked against.
    project_id: Option<ProjectId>,

    /// The day the work was performed.
    work_date: Option<NaiveDate>,

    /// Worked time on the quarter-hour grid.
    hours: Hours,

    /// Optional free-text comment.
    comment: Option<String>,

    /// Current lifecycle status.
    status: EntryStatus,

    /// Who entered the record.
    entered_by: Option<MemberId>,

    /// Set by EntryDeleted; the repository filters deleted entries.
    deleted: bool,
}

impl Aggregate for WorkEntry {
    type Event = WorkEntryEvent;
    type Error = WorkEntryError;

    fn aggregate_type() -> &'static str {
        "WorkEntry"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            WorkEntryEvent::EntryRecorded(data) => self.apply_recorded(data),
            WorkEntryEvent::EntryUpdated(data) => self.apply_updated(data),
            WorkEntryEvent::EntrySubmitted(_) => {
                self.status = EntryStatus::Submitted;
            }
            WorkEntryEvent::EntryApproved(_) => {
                self.status = EntryStatus::Approved;
            }
            WorkEntryEvent::EntryRejected(_) | WorkEntryEvent::EntryRecalled(_) => {
                self.status = EntryStatus::Draft;
            }
            WorkEntryEvent::EntryDeleted(_) => {
                self.deleted = true;
            }
        }
    }
}

impl SnapshotCapable for WorkEntry {
    fn snapshot_interval() -> usize {
        20
    }
}

// Query methods
impl WorkEntry {
    /// Returns the member the entry belongs to.
    pub fn member_id(&self) -> Option<MemberId> {
        self.member_id
    }

    /// Returns the project the entry is booked against.
    pub fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    /// Returns the work date.
    pub fn work_date(&self) -> Option<NaiveDate> {
        self.work_date
    }

    /// Returns the recorded hours.
    pub fn hours(&self) -> Hours {
        self.hours
    }

    /// Returns the comment, if any.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns the current status.
    pub fn status(&self) -> EntryStatus {
        self.status
    }

    /// Returns who entered the record.
    pub fn entered_by(&self) -> Option<MemberId> {
        self.entered_by
    }
}

// Command methods (return events)
impl WorkEntry {
    /// Records a new entry.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        entry_id: AggregateId,
        member_id: MemberId,
        project_id: ProjectId,
        work_date: NaiveDate,
        hours: Hours,
        comment: Option<String>,
        entered_by: MemberId,
    ) -> Result<Vec<WorkEntryEvent>, WorkEntryError> {
        if self.id.is_some() {
            return Err(WorkEntryError::AlreadyRecorded);
        }

        Self::validate_hours(hours)?;
        Self::validate_date(work_date)?;
        Self::validate_comment(comment.as_deref())?;

        Ok(vec![WorkEntryEvent::recorded(
            entry_id, member_id, project_id, work_date, hours, comment, entered_by,
        )])
    }

    /// Changes hours and comment while the entry is editable.
    pub fn update(
        &self,
        hours: Hours,
        comment: Option<String>,
        updated_by: MemberId,
    ) -> Result<Vec<WorkEntryEvent>, WorkEntryError> {
        if !self.status.can_edit() {
            return Err(WorkEntryError::NotEditable {
                status: self.status,
            });
        }

        Self::validate_hours(hours)?;
        Self::validate_comment(comment.as_deref())?;

        Ok(vec![WorkEntryEvent::updated(hours, comment, updated_by)])
    }

    /// Submits the entry for review.
    pub fn submit(&self, submitted_by: MemberId) -> Result<Vec<WorkEntryEvent>, WorkEntryError> {
        if !self.status.can_submit() {
            return Err(WorkEntryError::InvalidStatusTransition {
                current_status: self.status,
                action: "submit",
            });
        }

        Ok(vec![WorkEntryEvent::submitted(submitted_by)])
    }

    /// Approves the entry. Terminal: no further edits are possible.
    pub fn approve(&self, approved_by: MemberId) -> Result<Vec<WorkEntryEvent>, WorkEntryError> {
        if !self.status.can_approve() {
            return Err(WorkEntryError::InvalidStatusTransition {
                current_status: self.status,
                action: "approve",
            });
        }

        Ok(vec![WorkEntryEvent::approved(approved_by)])
    }

    /// Rejects the entry back to draft.
    pub fn reject(
        &self,
        rejected_by: MemberId,
        reason: impl Into<String>,
    ) -> Result<Vec<WorkEntryEvent>, WorkEntryError> {
        if !self.status.can_reject() {
            return Err(WorkEntryError::InvalidStatusTransition {
                current_status: self.status,
                action: "reject",
            });
        }

        Ok(vec![WorkEntryEvent::rejected(rejected_by, reason)])
    }

    /// Recalls the member's own submission back to draft.
    pub fn recall(&self, recalled_by: MemberId) -> Result<Vec<WorkEntryEvent>, WorkEntryError> {
        if !self.status.can_recall() {
            return Err(WorkEntryError::InvalidStatusTransition {
                current_status: self.status,
                action: "recall",
            });
        }

        Ok(vec![WorkEntryEvent::recalled(recalled_by)])
    }

    /// Logically deletes the entry.
    pub fn delete(&self, deleted_by: MemberId) -> Result<Vec<WorkEntryEvent>, WorkEntryError> {
        if !self.status.can_delete() {
            return Err(WorkEntryError::NotDeletable {
                status: self.status,
            });
        }

        Ok(vec![WorkEntryEvent::deleted(deleted_by)])
    }

    fn validate_hours(hours: Hours) -> Result<(), WorkEntryError> {
        if !hours.is_positive() || hours.exceeds_full_day() {
            return Err(WorkEntryError::InvalidHours { hours });
        }
        Ok(())
    }

    fn validate_date(work_date: NaiveDate) -> Result<(), WorkEntryError> {
        if work_date > Utc::now().date_naive() {
            return Err(WorkEntryError::DateInFuture { date: work_date });
        }
        Ok(())
    }

    fn validate_comment(comment: Option<&str>) -> Result<(), WorkEntryError> {
        if let Some(comment) = comment
            && comment.chars().count() > MAX_COMMENT_LEN
        {
            return Err(WorkEntryError::CommentTooLong {
                length: comment.chars().count(),
            });
        }
        Ok(())
    }
}

// Apply event helpers
impl WorkEntry {
    fn apply_recorded(&mut self, data: EntryRecordedData) {
        self.id = Some(data.entry_id);
        self.member_id = Some(data.member_id);
        self.project_id = Some(data.project_id);
        self.work_date = Some(data.work_date);
        self.hours = data.hours;
        self.comment = data.comment;
        self.entered_by = Some(data.entered_by);
        self.status = EntryStatus::Draft;
    }

    fn apply_updated(&mut self, data: EntryUpdatedData) {
        self.hours = data.hours;
        self.comment = data.comment;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DomainEvent;

    fn past_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    fn recorded_entry(hours: Hours) -> (WorkEntry, AggregateId, MemberId) {
        let mut entry = WorkEntry::default();
        let entry_id = AggregateId::new();
        let member = MemberId::new();
        let events = entry
            .record(
                entry_id,
                member,
                ProjectId::new(),
                past_date(),
                hours,
                None,
                member,
            )
            .unwrap();
        entry.apply_events(events);
        (entry, entry_id, member)
    }

    #[test]
    fn record_entry() {
        let (entry, entry_id, member) = recorded_entry(Hours::from_hours(8));
        assert_eq!(entry.id(), Some(entry_id));
        assert_eq!(entry.member_id(), Some(member));
        assert_eq!(entry.status(), EntryStatus::Draft);
        assert_eq!(entry.hours().as_quarters(), 32);
        assert!(!entry.is_deleted());
    }

    #[test]
    fn record_twice_fails() {
        let (entry, _, member) = recorded_entry(Hours::from_hours(8));
        let result = entry.record(
            AggregateId::new(),
            member,
            ProjectId::new(),
            past_date(),
            Hours::from_hours(1),
            None,
            member,
        );
        assert!(matches!(result, Err(WorkEntryError::AlreadyRecorded)));
    }

    #[test]
    fn record_rejects_non_positive_hours() {
        let entry = WorkEntry::default();
        let member = MemberId::new();
        let result = entry.record(
            AggregateId::new(),
            member,
            ProjectId::new(),
            past_date(),
            Hours::zero(),
            None,
            member,
        );
        assert!(matches!(result, Err(WorkEntryError::InvalidHours { .. })));

        let result = entry.record(
            AggregateId::new(),
            member,
            ProjectId::new(),
            past_date(),
            Hours::from_quarters(-4),
            None,
            member,
        );
        assert!(matches!(result, Err(WorkEntryError::InvalidHours { .. })));
    }

    #[test]
    fn record_rejects_more_than_a_day() {
        let entry = WorkEntry::default();
        let member = MemberId::new();
        let result = entry.record(
            AggregateId::new(),
            member,
            ProjectId::new(),
            past_date(),
            Hours::from_quarters(97),
            None,
            member,
        );
        assert!(matches!(result, Err(WorkEntryError::InvalidHours { .. })));
    }

    #[test]
    fn record_rejects_future_date() {
        let entry = WorkEntry::default();
        let member = MemberId::new();
        let tomorrow = Utc::now().date_naive().succ_opt().unwrap();
        let result = entry.record(
            AggregateId::new(),
            member,
            ProjectId::new(),
            tomorrow,
            Hours::from_hours(8),
            None,
            member,
        );
        assert!(matches!(result, Err(WorkEntryError::DateInFuture { .. })));
    }

    #[test]
    fn record_rejects_long_comment() {
        let entry = WorkEntry::default();
        let member = MemberId::new();
        let result = entry.record(
            AggregateId::new(),
            member,
            ProjectId::new(),
            past_date(),
            Hours::from_hours(8),
            Some("x".repeat(501)),
            member,
        );
        assert!(matches!(result, Err(WorkEntryError::CommentTooLong { .. })));
    }

    #[test]
    fn update_draft_entry() {
        let (mut entry, _, member) = recorded_entry(Hours::from_hours(8));
        let events = entry
            .update(Hours::from_quarters(18), Some("half day".to_string()), member)
            .unwrap();
        entry.apply_events(events);

        assert_eq!(entry.hours().as_quarters(), 18);
        assert_eq!(entry.comment(), Some("half day"));
    }

    #[test]
    fn submit_then_approve_is_terminal() {
        let (mut entry, _, member) = recorded_entry(Hours::from_hours(8));
        let reviewer = MemberId::new();

        entry.apply_events(entry.submit(member).unwrap());
        assert_eq!(entry.status(), EntryStatus::Submitted);

        entry.apply_events(entry.approve(reviewer).unwrap());
        assert_eq!(entry.status(), EntryStatus::Approved);

        let result = entry.update(Hours::from_hours(4), None, member);
        assert!(matches!(
            result,
            Err(WorkEntryError::NotEditable {
                status: EntryStatus::Approved
            })
        ));

        let result = entry.delete(member);
        assert!(matches!(result, Err(WorkEntryError::NotDeletable { .. })));
    }

    #[test]
    fn reject_returns_entry_to_draft() {
        let (mut entry, _, member) = recorded_entry(Hours::from_hours(8));
        let reviewer = MemberId::new();

        entry.apply_events(entry.submit(member).unwrap());
        entry.apply_events(entry.reject(reviewer, "wrong project").unwrap());

        assert_eq!(entry.status(), EntryStatus::Draft);
        assert!(entry.update(Hours::from_hours(4), None, member).is_ok());
    }

    #[test]
    fn recall_returns_entry_to_draft() {
        let (mut entry, _, member) = recorded_entry(Hours::from_hours(8));

        entry.apply_events(entry.submit(member).unwrap());
        entry.apply_events(entry.recall(member).unwrap());

        assert_eq!(entry.status(), EntryStatus::Draft);
    }

    #[test]
    fn submit_twice_fails() {
        let (mut entry, _, member) = recorded_entry(Hours::from_hours(8));
        entry.apply_events(entry.submit(member).unwrap());

        let result = entry.submit(member);
        assert!(matches!(
            result,
            Err(WorkEntryError::InvalidStatusTransition { action: "submit", .. })
        ));
    }

    #[test]
    fn approve_draft_fails() {
        let (entry, _, _) = recorded_entry(Hours::from_hours(8));
        let result = entry.approve(MemberId::new());
        assert!(matches!(
            result,
            Err(WorkEntryError::InvalidStatusTransition { action: "approve", .. })
        ));
    }

    #[test]
    fn delete_flips_deleted_flag() {
        let (mut entry, _, member) = recorded_entry(Hours::from_hours(8));
        entry.apply_events(entry.delete(member).unwrap());
        assert!(entry.is_deleted());
    }

    #[test]
    fn submitted_entry_is_not_deletable() {
        let (mut entry, _, member) = recorded_entry(Hours::from_hours(8));
        entry.apply_events(entry.submit(member).unwrap());
        assert!(matches!(
            entry.delete(member),
            Err(WorkEntryError::NotDeletable { .. })
        ));
    }

    #[test]
    fn full_lifecycle_event_types() {
        let (mut entry, _, member) = recorded_entry(Hours::from_hours(8));
        let events = entry.submit(member).unwrap();
        assert_eq!(events[0].event_type(), "EntrySubmitted");
        entry.apply_events(events);

        let events = entry.approve(MemberId::new()).unwrap();
        assert_eq!(events[0].event_type(), "EntryApproved");
    }

    #[test]
    fn serialization_roundtrip() {
        let (entry, entry_id, _) = recorded_entry(Hours::from_quarters(33));
        let json = serde_json::to_string(&entry).unwrap();
        let back: WorkEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), Some(entry_id));
        assert_eq!(back.hours().as_quarters(), 33);
        assert_eq!(back.status(), EntryStatus::Draft);
    }
}
