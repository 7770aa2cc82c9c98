//! Workflow commands.
//!
//! Strongly-typed command values. Input parsing and authentication happen
//! in the surrounding layers; actor ids arriving here are assumed to be
//! already authenticated.

use chrono::NaiveDate;
use common::AggregateId;
use domain::{AbsenceType, FiscalMonth, Hours, MemberId, ProjectId};

/// Command to record a new work entry.
#[derive(Debug, Clone)]
pub struct RecordEntry {
    /// The id the new entry will get.
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

    /// Who enters the record (the member, or a manager by proxy).
    pub entered_by: MemberId,
}

impl RecordEntry {
    /// Creates a RecordEntry command with a generated entry id.
    pub fn new(
        member_id: MemberId,
        project_id: ProjectId,
        work_date: NaiveDate,
        hours: Hours,
        entered_by: MemberId,
    ) -> Self {
        Self {
            entry_id: AggregateId::new(),
            member_id,
            project_id,
            work_date,
            hours,
            comment: None,
            entered_by,
        }
    }

    /// Attaches a comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Command to change an entry's hours and comment.
#[derive(Debug, Clone)]
pub struct UpdateEntry {
    /// The entry to update.
    pub entry_id: AggregateId,

    /// New worked time.
    pub hours: Hours,

    /// New comment.
    pub comment: Option<String>,

    /// Who makes the change.
    pub updated_by: MemberId,
}

impl UpdateEntry {
    /// Creates an UpdateEntry command.
    pub fn new(entry_id: AggregateId, hours: Hours, updated_by: MemberId) -> Self {
        Self {
            entry_id,
            hours,
            comment: None,
            updated_by,
        }
    }

    /// Attaches a comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Command to delete an entry.
#[derive(Debug, Clone)]
pub struct DeleteEntry {
    /// The entry to delete.
    pub entry_id: AggregateId,

    /// Who deletes it.
    pub deleted_by: MemberId,
}

impl DeleteEntry {
    /// Creates a DeleteEntry command.
    pub fn new(entry_id: AggregateId, deleted_by: MemberId) -> Self {
        Self {
            entry_id,
            deleted_by,
        }
    }
}

/// Command to record a new absence.
#[derive(Debug, Clone)]
pub struct RecordAbsence {
    /// The id the new absence will get.
    pub absence_id: AggregateId,

    /// The member the absence is attributed to.
    pub member_id: MemberId,

    /// The day of the absence.
    pub absence_date: NaiveDate,

    /// The absence category.
    pub absence_type: AbsenceType,

    /// Optional free-text reason.
    pub reason: Option<String>,

    /// Who enters the record.
    pub entered_by: MemberId,
}

impl RecordAbsence {
    /// Creates a RecordAbsence command with a generated absence id.
    pub fn new(
        member_id: MemberId,
        absence_date: NaiveDate,
        absence_type: AbsenceType,
        entered_by: MemberId,
    ) -> Self {
        Self {
            absence_id: AggregateId::new(),
            member_id,
            absence_date,
            absence_type,
            reason: None,
            entered_by,
        }
    }

    /// Attaches a reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Command to change an absence's type and reason.
#[derive(Debug, Clone)]
pub struct UpdateAbsence {
    /// The absence to update.
    pub absence_id: AggregateId,

    /// New absence category.
    pub absence_type: AbsenceType,

    /// New reason.
    pub reason: Option<String>,

    /// Who makes the change.
    pub updated_by: MemberId,
}

impl UpdateAbsence {
    /// Creates an UpdateAbsence command.
    pub fn new(absence_id: AggregateId, absence_type: AbsenceType, updated_by: MemberId) -> Self {
        Self {
            absence_id,
            absence_type,
            reason: None,
            updated_by,
        }
    }

    /// Attaches a reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Command to delete an absence.
#[derive(Debug, Clone)]
pub struct DeleteAbsence {
    /// The absence to delete.
    pub absence_id: AggregateId,

    /// Who deletes it.
    pub deleted_by: MemberId,
}

impl DeleteAbsence {
    /// Creates a DeleteAbsence command.
    pub fn new(absence_id: AggregateId, deleted_by: MemberId) -> Self {
        Self {
            absence_id,
            deleted_by,
        }
    }
}

/// Command to submit every draft entry and absence of one day.
#[derive(Debug, Clone)]
pub struct SubmitDay {
    /// The member whose day is submitted.
    pub member_id: MemberId,

    /// The day to submit.
    pub work_date: NaiveDate,

    /// Who submits (the member, or a manager by proxy).
    pub submitted_by: MemberId,
}

impl SubmitDay {
    /// Creates a SubmitDay command.
    pub fn new(member_id: MemberId, work_date: NaiveDate, submitted_by: MemberId) -> Self {
        Self {
            member_id,
            work_date,
            submitted_by,
        }
    }
}

/// Command to submit every draft entry and absence of a fiscal month.
#[derive(Debug, Clone)]
pub struct SubmitMonth {
    /// The member whose month is submitted.
    pub member_id: MemberId,

    /// The fiscal month to submit.
    pub fiscal_month: FiscalMonth,

    /// Who submits (the member, or a manager by proxy).
    pub submitted_by: MemberId,
}

impl SubmitMonth {
    /// Creates a SubmitMonth command.
    pub fn new(member_id: MemberId, fiscal_month: FiscalMonth, submitted_by: MemberId) -> Self {
        Self {
            member_id,
            fiscal_month,
            submitted_by,
        }
    }
}

/// Command to approve one day's submitted set.
#[derive(Debug, Clone)]
pub struct ApproveDay {
    /// The member whose day is approved.
    pub member_id: MemberId,

    /// The day to approve.
    pub work_date: NaiveDate,

    /// The reviewer approving.
    pub approved_by: MemberId,
}

impl ApproveDay {
    /// Creates an ApproveDay command.
    pub fn new(member_id: MemberId, work_date: NaiveDate, approved_by: MemberId) -> Self {
        Self {
            member_id,
            work_date,
            approved_by,
        }
    }
}

/// Command to approve a member's submitted fiscal month.
#[derive(Debug, Clone)]
pub struct ApproveMonth {
    /// The member whose month is approved.
    pub member_id: MemberId,

    /// The fiscal month to approve.
    pub fiscal_month: FiscalMonth,

    /// The reviewer approving.
    pub approved_by: MemberId,
}

impl ApproveMonth {
    /// Creates an ApproveMonth command.
    pub fn new(member_id: MemberId, fiscal_month: FiscalMonth, approved_by: MemberId) -> Self {
        Self {
            member_id,
            fiscal_month,
            approved_by,
        }
    }
}

/// Command to reject one day's submitted set back to draft.
#[derive(Debug, Clone)]
pub struct RejectDay {
    /// The member whose day is rejected.
    pub member_id: MemberId,

    /// The day to reject.
    pub work_date: NaiveDate,

    /// The reviewer rejecting.
    pub rejected_by: MemberId,

    /// Mandatory reason, non-blank, at most 1000 chars.
    pub reason: String,
}

impl RejectDay {
    /// Creates a RejectDay command.
    pub fn new(
        member_id: MemberId,
        work_date: NaiveDate,
        rejected_by: MemberId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            member_id,
            work_date,
            rejected_by,
            reason: reason.into(),
        }
    }
}

/// Command to reject a member's submitted fiscal month.
#[derive(Debug, Clone)]
pub struct RejectMonth {
    /// The member whose month is rejected.
    pub member_id: MemberId,

    /// The fiscal month to reject.
    pub fiscal_month: FiscalMonth,

    /// The reviewer rejecting.
    pub rejected_by: MemberId,

    /// Mandatory reason, non-blank, at most 1000 chars.
    pub reason: String,
}

impl RejectMonth {
    /// Creates a RejectMonth command.
    pub fn new(
        member_id: MemberId,
        fiscal_month: FiscalMonth,
        rejected_by: MemberId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            member_id,
            fiscal_month,
            rejected_by,
            reason: reason.into(),
        }
    }
}

/// Command for a member to recall their own submitted day.
#[derive(Debug, Clone)]
pub struct RecallDay {
    /// The member whose day is recalled.
    pub member_id: MemberId,

    /// The day to recall.
    pub work_date: NaiveDate,

    /// Who recalls. Must be the member themselves.
    pub recalled_by: MemberId,
}

impl RecallDay {
    /// Creates a RecallDay command.
    pub fn new(member_id: MemberId, work_date: NaiveDate, recalled_by: MemberId) -> Self {
        Self {
            member_id,
            work_date,
            recalled_by,
        }
    }
}

/// Command for a member to recall their own submitted fiscal month.
#[derive(Debug, Clone)]
pub struct RecallMonth {
    /// The member whose month is recalled.
    pub member_id: MemberId,

    /// The fiscal month to recall.
    pub fiscal_month: FiscalMonth,

    /// Who recalls. Must be the member themselves.
    pub recalled_by: MemberId,
}

impl RecallMonth {
    /// Creates a RecallMonth command.
    pub fn new(member_id: MemberId, fiscal_month: FiscalMonth, recalled_by: MemberId) -> Self {
        Self {
            member_id,
            fiscal_month,
            recalled_by,
        }
    }
}
