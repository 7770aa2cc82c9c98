//! Work-entry domain events.

use chrono::{DateTime, NaiveDate, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::values::{Hours, MemberId, ProjectId};

/// Events that can occur on a work-log entry aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WorkEntryEvent {
    /// Entry was recorded for a member, project, and date.
    EntryRecorded(EntryRecordedData),

    /// Hours or comment were changed while the entry was editable.
    EntryUpdated(EntryUpdatedData),

    /// Entry was submitted for review.
    EntrySubmitted(EntrySubmittedData),

    /// Entry was approved; the aggregate is read-only from here on.
    EntryApproved(EntryApprovedData),

    /// Entry was rejected back to draft by a reviewer.
    EntryRejected(EntryRejectedData),

    /// Entry was recalled back to draft by its member.
    EntryRecalled(EntryRecalledData),

    /// Entry was logically deleted.
    EntryDeleted(EntryDeletedData),
}

impl DomainEvent for WorkEntryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            WorkEntryEvent::EntryRecorded(_) => "EntryRecorded",
            WorkEntryEvent::EntryUpdated(_) => "EntryUpdated",
            WorkEntryEvent::EntrySubmitted(_) => "EntrySubmitted",
            WorkEntryEvent::EntryApproved(_) => "EntryApproved",
            WorkEntryEvent::EntryRejected(_) => "EntryRejected",
            WorkEntryEvent::EntryRecalled(_) => "EntryRecalled",
            WorkEntryEvent::EntryDeleted(_) => "EntryDeleted",
        }
    }
}

/// Data for EntryRecorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRecordedData {
    /// The unique entry ID.
    pub entry_id: AggregateId,

    /// The member the entry is attributed to.
    pub member_id: MemberId,

    /// The project hours are booked against.
    pub project_id: ProjectId,

    /// The day the work was performed.
    pub work_date: NaiveDate,

    /// Worked time on the quarter-hour grid.
    pub hours: Hours,

    /// Optional free-text comment.
    pub comment: Option<String>,

    /// Who entered the record (the member, or a manager by proxy).
    pub entered_by: MemberId,

    /// When the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Data for EntryUpdated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryUpdatedData {
    /// New worked time.
    pub hours: Hours,

    /// New comment.
    pub comment: Option<String>,

    /// Who made the change.
    pub updated_by: MemberId,

    /// When the change was made.
    pub updated_at: DateTime<Utc>,
}

/// Data for EntrySubmitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySubmittedData {
    /// Who submitted (the member, or a manager by proxy).
    pub submitted_by: MemberId,

    /// When the entry was submitted.
    pub submitted_at: DateTime<Utc>,
}

/// Data for EntryApproved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryApprovedData {
    /// The reviewer who approved.
    pub approved_by: MemberId,

    /// When the entry was approved.
    pub approved_at: DateTime<Utc>,
}

/// Data for EntryRejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRejectedData {
    /// The reviewer who rejected.
    pub rejected_by: MemberId,

    /// Why the entry was rejected.
    pub reason: String,

    /// When the entry was rejected.
    pub rejected_at: DateTime<Utc>,
}

/// Data for EntryRecalled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRecalledData {
    /// The member who recalled their own submission.
    pub recalled_by: MemberId,

    /// When the entry was recalled.
    pub recalled_at: DateTime<Utc>,
}

/// Data for EntryDeleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryDeletedData {
    /// Who deleted the entry.
    pub deleted_by: MemberId,

    /// When the entry was deleted.
    pub deleted_at: DateTime<Utc>,
}

// Convenience constructors for events
impl WorkEntryEvent {
    /// Creates an EntryRecorded event.
    #[allow(clippy::too_many_arguments)]
    pub fn recorded(
        entry_id: AggregateId,
        member_id: MemberId,
        project_id: ProjectId,
        work_date: NaiveDate,
        hours: Hours,
        comment: Option<String>,
        entered_by: MemberId,
    ) -> Self {
        WorkEntryEvent::EntryRecorded(EntryRecordedData {
            entry_id,
            member_id,
            project_id,
            work_date,
            hours,
            comment,
            entered_by,
            recorded_at: Utc::now(),
        })
    }

    /// Creates an EntryUpdated event.
    pub fn updated(hours: Hours, comment: Option<String>, updated_by: MemberId) -> Self {
        WorkEntryEvent::EntryUpdated(EntryUpdatedData {
            hours,
            comment,
            updated_by,
            updated_at: Utc::now(),
        })
    }

    /// Creates an EntrySubmitted event.
    pub fn submitted(submitted_by: MemberId) -> Self {
        WorkEntryEvent::EntrySubmitted(EntrySubmittedData {
            submitted_by,
            submitted_at: Utc::now(),
        })
    }

    /// Creates an EntryApproved event.
    pub fn approved(approved_by: MemberId) -> Self {
        WorkEntryEvent::EntryApproved(EntryApprovedData {
            approved_by,
            approved_at: Utc::now(),
        })
    }

    /// Creates an EntryRejected event.
    pub fn rejected(rejected_by: MemberId, reason: impl Into<String>) -> Self {
        WorkEntryEvent::EntryRejected(EntryRejectedData {
            rejected_by,
            reason: reason.into(),
            rejected_at: Utc::now(),
        })
    }

    /// Creates an EntryRecalled event.
    pub fn recalled(recalled_by: MemberId) -> Self {
        WorkEntryEvent::EntryRecalled(EntryRecalledData {
            recalled_by,
            recalled_at: Utc::now(),
        })
    }

    /// Creates an EntryDeleted event.
    pub fn deleted(deleted_by: MemberId) -> Self {
        WorkEntryEvent::EntryDeleted(EntryDeletedData {
            deleted_by,
            deleted_at: Utc::now(),
        })
    }
}
