//! Absence aggregate.

use chrono::{NaiveDate, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::values::MemberId;

use super::{
    AbsenceError, AbsenceEvent, AbsenceStatus, AbsenceType, MAX_REASON_LEN,
    events::{AbsenceRecordedData, AbsenceUpdatedData},
};

/// Absence aggregate root.
///
/// Records one member's absence on one day. Structurally parallel to the
/// work entry, except rejection lands in an explicit Rejected state and
/// editing a rejected absence returns it to Draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Absence {
    /// Unique absence identifier.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// The member the absence is attributed to.
    member_id: Option<MemberId>,

    /// The day of the absence.
    absence_date: Option<NaiveDate>,

    /// The absence category.
    absence_type: Option<AbsenceType>,

    /// Optional free-text reason.
    reason: Option<String>,

    /// Current lifecycle status.
    status: AbsenceStatus,

    /// Who entered the record.
    entered_by: Option<MemberId>,

    /// Set by AbsenceDeleted; the repository filters deleted absences.
    deleted: bool,
}

impl Aggregate for Absence {
    type Event = AbsenceEvent;
    type Error = AbsenceError;

    fn aggregate_type() -> &'static str {
        "Absence"
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
            AbsenceEvent::AbsenceRecorded(data) => self.apply_recorded(data),
            AbsenceEvent::AbsenceUpdated(data) => self.apply_updated(data),
            AbsenceEvent::AbsenceSubmitted(_) => {
                self.status = AbsenceStatus::Submitted;
            }
            AbsenceEvent::AbsenceApproved(_) => {
                self.status = AbsenceStatus::Approved;
            }
            AbsenceEvent::AbsenceRejected(_) => {
                self.status = AbsenceStatus::Rejected;
            }
            AbsenceEvent::AbsenceRecalled(_) => {
                self.status = AbsenceStatus::Draft;
            }
            AbsenceEvent::AbsenceDeleted(_) => {
                self.deleted = true;
            }
        }
    }
}

impl SnapshotCapable for Absence {
    fn snapshot_interval() -> usize {
        20
    }
}

// Query methods
impl Absence {
    /// Returns the member the absence belongs to.
    pub fn member_id(&self) -> Option<MemberId> {
        self.member_id
    }

    /// Returns the absence date.
    pub fn absence_date(&self) -> Option<NaiveDate> {
        self.absence_date
    }

    /// Returns the absence category.
    pub fn absence_type(&self) -> Option<AbsenceType> {
        self.absence_type
    }

    /// Returns the reason, if any.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns the current status.
    pub fn status(&self) -> AbsenceStatus {
        self.status
    }

    /// Returns who entered the record.
    pub fn entered_by(&self) -> Option<MemberId> {
        self.entered_by
    }
}

// Command methods (return events)
impl Absence {
    /// Records a new absence.
    pub fn record(
        &self,
        absence_id: AggregateId,
        member_id: MemberId,
        absence_date: NaiveDate,
        absence_type: AbsenceType,
        reason: Option<String>,
        entered_by: MemberId,
    ) -> Result<Vec<AbsenceEvent>, AbsenceError> {
        if self.id.is_some() {
            return Err(AbsenceError::AlreadyRecorded);
        }

        Self::validate_date(absence_date)?;
        Self::validate_reason(reason.as_deref())?;

        Ok(vec![AbsenceEvent::recorded(
            absence_id,
            member_id,
            absence_date,
            absence_type,
            reason,
            entered_by,
        )])
    }

    /// Changes type and reason while editable.
    ///
    /// Editing a rejected absence implicitly returns it to draft.
    pub fn update(
        &self,
        absence_type: AbsenceType,
        reason: Option<String>,
        updated_by: MemberId,
    ) -> Result<Vec<AbsenceEvent>, AbsenceError> {
        if !self.status.can_edit() {
            return Err(AbsenceError::NotEditable {
                status: self.status,
            });
        }

        Self::validate_reason(reason.as_deref())?;

        Ok(vec![AbsenceEvent::updated(absence_type, reason, updated_by)])
    }

    /// Submits the absence for review.
    pub fn submit(&self, submitted_by: MemberId) -> Result<Vec<AbsenceEvent>, AbsenceError> {
        if !self.status.can_submit() {
            return Err(AbsenceError::InvalidStatusTransition {
                current_status: self.status,
                action: "submit",
            });
        }

        Ok(vec![AbsenceEvent::submitted(submitted_by)])
    }

    /// Approves the absence. Terminal: no further edits are possible.
    pub fn approve(&self, approved_by: MemberId) -> Result<Vec<AbsenceEvent>, AbsenceError> {
        if !self.status.can_approve() {
            return Err(AbsenceError::InvalidStatusTransition {
                current_status: self.status,
                action: "approve",
            });
        }

        Ok(vec![AbsenceEvent::approved(approved_by)])
    }

    /// Rejects the absence into the Rejected state.
    pub fn reject(
        &self,
        rejected_by: MemberId,
        reason: impl Into<String>,
    ) -> Result<Vec<AbsenceEvent>, AbsenceError> {
        if !self.status.can_reject() {
            return Err(AbsenceError::InvalidStatusTransition {
                current_status: self.status,
                action: "reject",
            });
        }

        Ok(vec![AbsenceEvent::rejected(rejected_by, reason)])
    }

    /// Recalls the member's own submission back to draft.
    pub fn recall(&self, recalled_by: MemberId) -> Result<Vec<AbsenceEvent>, AbsenceError> {
        if !self.status.can_recall() {
            return Err(AbsenceError::InvalidStatusTransition {
                current_status: self.status,
                action: "recall",
            });
        }

        Ok(vec![AbsenceEvent::recalled(recalled_by)])
    }

    /// Logically deletes the absence (allowed from Draft or Rejected).
    pub fn delete(&self, deleted_by: MemberId) -> Result<Vec<AbsenceEvent>, AbsenceError> {
        if !self.status.can_delete() {
            return Err(AbsenceError::NotDeletable {
                status: self.status,
            });
        }

        Ok(vec![AbsenceEvent::deleted(deleted_by)])
    }

    fn validate_date(absence_date: NaiveDate) -> Result<(), AbsenceError> {
        if absence_date > Utc::now().date_naive() {
            return Err(AbsenceError::DateInFuture { date: absence_date });
        }
        Ok(())
    }

    fn validate_reason(reason: Option<&str>) -> Result<(), AbsenceError> {
        if let Some(reason) = reason
            && reason.chars().count() > MAX_REASON_LEN
        {
            return Err(AbsenceError::ReasonTooLong {
                length: reason.chars().count(),
            });
        }
        Ok(())
    }
}

// Apply event helpers
impl Absence {
    fn apply_recorded(&mut self, data: AbsenceRecordedData) {
        self.id = Some(data.absence_id);
        self.member_id = Some(data.member_id);
        self.absence_date = Some(data.absence_date);
        self.absence_type = Some(data.absence_type);
        self.reason = data.reason;
        self.entered_by = Some(data.entered_by);
        self.status = AbsenceStatus::Draft;
    }

    fn apply_updated(&mut self, data: AbsenceUpdatedData) {
        self.absence_type = Some(data.absence_type);
        self.reason = data.reason;
        // Editing a rejected absence makes it a draft again.
        self.status = AbsenceStatus::Draft;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn past_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    fn recorded_absence() -> (Absence, AggregateId, MemberId) {
        let mut absence = Absence::default();
        let absence_id = AggregateId::new();
        let member = MemberId::new();
        let events = absence
            .record(
                absence_id,
                member,
                past_date(),
                AbsenceType::PaidLeave,
                None,
                member,
            )
            .unwrap();
        absence.apply_events(events);
        (absence, absence_id, member)
    }

    #[test]
    fn record_absence() {
        let (absence, absence_id, member) = recorded_absence();
        assert_eq!(absence.id(), Some(absence_id));
        assert_eq!(absence.member_id(), Some(member));
        assert_eq!(absence.absence_type(), Some(AbsenceType::PaidLeave));
        assert_eq!(absence.status(), AbsenceStatus::Draft);
    }

    #[test]
    fn record_twice_fails() {
        let (absence, _, member) = recorded_absence();
        let result = absence.record(
            AggregateId::new(),
            member,
            past_date(),
            AbsenceType::Other,
            None,
            member,
        );
        assert!(matches!(result, Err(AbsenceError::AlreadyRecorded)));
    }

    #[test]
    fn record_rejects_future_date() {
        let absence = Absence::default();
        let member = MemberId::new();
        let tomorrow = Utc::now().date_naive().succ_opt().unwrap();
        let result = absence.record(
            AggregateId::new(),
            member,
            tomorrow,
            AbsenceType::PaidLeave,
            None,
            member,
        );
        assert!(matches!(result, Err(AbsenceError::DateInFuture { .. })));
    }

    #[test]
    fn record_rejects_long_reason() {
        let absence = Absence::default();
        let member = MemberId::new();
        let result = absence.record(
            AggregateId::new(),
            member,
            past_date(),
            AbsenceType::SickLeave,
            Some("x".repeat(501)),
            member,
        );
        assert!(matches!(result, Err(AbsenceError::ReasonTooLong { .. })));
    }

    #[test]
    fn reject_lands_in_rejected_state() {
        let (mut absence, _, member) = recorded_absence();
        let reviewer = MemberId::new();

        absence.apply_events(absence.submit(member).unwrap());
        absence.apply_events(absence.reject(reviewer, "no coverage").unwrap());

        assert_eq!(absence.status(), AbsenceStatus::Rejected);
    }

    #[test]
    fn editing_rejected_absence_returns_it_to_draft() {
        let (mut absence, _, member) = recorded_absence();
        let reviewer = MemberId::new();

        absence.apply_events(absence.submit(member).unwrap());
        absence.apply_events(absence.reject(reviewer, "no coverage").unwrap());

        let events = absence
            .update(AbsenceType::SpecialLeave, Some("wedding".to_string()), member)
            .unwrap();
        absence.apply_events(events);

        assert_eq!(absence.status(), AbsenceStatus::Draft);
        assert_eq!(absence.absence_type(), Some(AbsenceType::SpecialLeave));
        assert_eq!(absence.reason(), Some("wedding"));
    }

    #[test]
    fn rejected_absence_is_deletable() {
        let (mut absence, _, member) = recorded_absence();
        let reviewer = MemberId::new();

        absence.apply_events(absence.submit(member).unwrap());
        absence.apply_events(absence.reject(reviewer, "no coverage").unwrap());

        absence.apply_events(absence.delete(member).unwrap());
        assert!(absence.is_deleted());
    }

    #[test]
    fn approved_absence_is_immutable() {
        let (mut absence, _, member) = recorded_absence();
        let reviewer = MemberId::new();

        absence.apply_events(absence.submit(member).unwrap());
        absence.apply_events(absence.approve(reviewer).unwrap());

        assert_eq!(absence.status(), AbsenceStatus::Approved);
        assert!(matches!(
            absence.update(AbsenceType::Other, None, member),
            Err(AbsenceError::NotEditable { .. })
        ));
        assert!(matches!(
            absence.delete(member),
            Err(AbsenceError::NotDeletable { .. })
        ));
    }

    #[test]
    fn recall_returns_absence_to_draft() {
        let (mut absence, _, member) = recorded_absence();

        absence.apply_events(absence.submit(member).unwrap());
        absence.apply_events(absence.recall(member).unwrap());

        assert_eq!(absence.status(), AbsenceStatus::Draft);
    }

    #[test]
    fn rejected_absence_cannot_be_submitted_without_edit() {
        let (mut absence, _, member) = recorded_absence();
        let reviewer = MemberId::new();

        absence.apply_events(absence.submit(member).unwrap());
        absence.apply_events(absence.reject(reviewer, "no coverage").unwrap());

        assert!(matches!(
            absence.submit(member),
            Err(AbsenceError::InvalidStatusTransition { action: "submit", .. })
        ));
    }

    #[test]
    fn serialization_roundtrip() {
        let (absence, absence_id, _) = recorded_absence();
        let json = serde_json::to_string(&absence).unwrap();
        let back: Absence = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), Some(absence_id));
        assert_eq!(back.status(), AbsenceStatus::Draft);
    }
}
