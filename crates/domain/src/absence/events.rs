//! Absence domain events.

use chrono::{DateTime, NaiveDate, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::values::MemberId;

use super::AbsenceType;

/// Events that can occur on an absence aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AbsenceEvent {
    /// Absence was recorded for a member and date.
    AbsenceRecorded(AbsenceRecordedData),

    /// Type or reason were changed; a rejected absence returns to draft.
    AbsenceUpdated(AbsenceUpdatedData),

    /// Absence was submitted for review.
    AbsenceSubmitted(AbsenceSubmittedData),

    /// Absence was approved; read-only from here on.
    AbsenceApproved(AbsenceApprovedData),

    /// Absence was rejected by a reviewer.
    AbsenceRejected(AbsenceRejectedData),

    /// Absence was recalled back to draft by its member.
    AbsenceRecalled(AbsenceRecalledData),

    /// Absence was logically deleted.
    AbsenceDeleted(AbsenceDeletedData),
}

impl DomainEvent for AbsenceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AbsenceEvent::AbsenceRecorded(_) => "AbsenceRecorded",
            AbsenceEvent::AbsenceUpdated(_) => "AbsenceUpdated",
            AbsenceEvent::AbsenceSubmitted(_) => "AbsenceSubmitted",
            AbsenceEvent::AbsenceApproved(_) => "AbsenceApproved",
            AbsenceEvent::AbsenceRejected(_) => "AbsenceRejected",
            AbsenceEvent::AbsenceRecalled(_) => "AbsenceRecalled",
            AbsenceEvent::AbsenceDeleted(_) => "AbsenceDeleted",
        }
    }
}

/// Data for AbsenceRecorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceRecordedData {
    /// The unique absence ID.
    pub absence_id: AggregateId,

    /// The member the absence is attributed to.
    pub member_id: MemberId,

    /// The day of the absence.
    pub absence_date: NaiveDate,

    /// The absence category.
    pub absence_type: AbsenceType,

    /// Optional free-text reason.
    pub reason: Option<String>,

    /// Who entered the record (the member, or a manager by proxy).
    pub entered_by: MemberId,

    /// When the absence was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Data for AbsenceUpdated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceUpdatedData {
    /// New absence category.
    pub absence_type: AbsenceType,

    /// New reason.
    pub reason: Option<String>,

    /// Who made the change.
    pub updated_by: MemberId,

    /// When the change was made.
    pub updated_at: DateTime<Utc>,
}

/// Data for AbsenceSubmitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceSubmittedData {
    /// Who submitted.
    pub submitted_by: MemberId,

    /// When the absence was submitted.
    pub submitted_at: DateTime<Utc>,
}

/// Data for AbsenceApproved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceApprovedData {
    /// The reviewer who approved.
    pub approved_by: MemberId,

    /// When the absence was approved.
    pub approved_at: DateTime<Utc>,
}

/// Data for AbsenceRejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceRejectedData {
    /// The reviewer who rejected.
    pub rejected_by: MemberId,

    /// Why the absence was rejected.
    pub reason: String,

    /// When the absence was rejected.
    pub rejected_at: DateTime<Utc>,
}

/// Data for AbsenceRecalled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceRecalledData {
    /// The member who recalled their own submission.
    pub recalled_by: MemberId,

    /// When the absence was recalled.
    pub recalled_at: DateTime<Utc>,
}

/// Data for AbsenceDeleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceDeletedData {
    /// Who deleted the absence.
    pub deleted_by: MemberId,

    /// When the absence was deleted.
    pub deleted_at: DateTime<Utc>,
}

// Convenience constructors for events
impl AbsenceEvent {
    /// Creates an AbsenceRecorded event.
    pub fn recorded(
        absence_id: AggregateId,
        member_id: MemberId,
        absence_date: NaiveDate,
        absence_type: AbsenceType,
        reason: Option<String>,
        entered_by: MemberId,
    ) -> Self {
        AbsenceEvent::AbsenceRecorded(AbsenceRecordedData {
            absence_id,
            member_id,
            absence_date,
            absence_type,
            reason,
            entered_by,
            recorded_at: Utc::now(),
        })
    }

    /// Creates an AbsenceUpdated event.
    pub fn updated(absence_type: AbsenceType, reason: Option<String>, updated_by: MemberId) -> Self {
        AbsenceEvent::AbsenceUpdated(AbsenceUpdatedData {
            absence_type,
            reason,
            updated_by,
            updated_at: Utc::now(),
        })
    }

    /// Creates an AbsenceSubmitted event.
    pub fn submitted(submitted_by: MemberId) -> Self {
        AbsenceEvent::AbsenceSubmitted(AbsenceSubmittedData {
            submitted_by,
            submitted_at: Utc::now(),
        })
    }

    /// Creates an AbsenceApproved event.
    pub fn approved(approved_by: MemberId) -> Self {
        AbsenceEvent::AbsenceApproved(AbsenceApprovedData {
            approved_by,
            approved_at: Utc::now(),
        })
    }

    /// Creates an AbsenceRejected event.
    pub fn rejected(rejected_by: MemberId, reason: impl Into<String>) -> Self {
        AbsenceEvent::AbsenceRejected(AbsenceRejectedData {
            rejected_by,
            reason: reason.into(),
            rejected_at: Utc::now(),
        })
    }

    /// Creates an AbsenceRecalled event.
    pub fn recalled(recalled_by: MemberId) -> Self {
        AbsenceEvent::AbsenceRecalled(AbsenceRecalledData {
            recalled_by,
            recalled_at: Utc::now(),
        })
    }

    /// Creates an AbsenceDeleted event.
    pub fn deleted(deleted_by: MemberId) -> Self {
        AbsenceEvent::AbsenceDeleted(AbsenceDeletedData {
            deleted_by,
            deleted_at: Utc::now(),
        })
    }
}
