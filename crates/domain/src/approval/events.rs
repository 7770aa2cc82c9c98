//! Monthly approval domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::values::{FiscalMonth, MemberId};

/// Events that can occur on a monthly approval aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ApprovalEvent {
    /// The approval record for a member's fiscal month was opened.
    ApprovalOpened(ApprovalOpenedData),

    /// The month was submitted with its entry and absence id sets.
    ApprovalSubmitted(ApprovalSubmittedData),

    /// The month was approved.
    ApprovalApproved(ApprovalApprovedData),

    /// The month was rejected.
    ApprovalRejected(ApprovalRejectedData),

    /// The submission was recalled; the month is pending again.
    ApprovalReopened(ApprovalReopenedData),
}

impl DomainEvent for ApprovalEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ApprovalEvent::ApprovalOpened(_) => "ApprovalOpened",
            ApprovalEvent::ApprovalSubmitted(_) => "ApprovalSubmitted",
            ApprovalEvent::ApprovalApproved(_) => "ApprovalApproved",
            ApprovalEvent::ApprovalRejected(_) => "ApprovalRejected",
            ApprovalEvent::ApprovalReopened(_) => "ApprovalReopened",
        }
    }
}

/// Data for ApprovalOpened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalOpenedData {
    /// The approval id, derived from the `(member, fiscal month)` key.
    pub approval_id: AggregateId,

    /// The member whose month this is.
    pub member_id: MemberId,

    /// The fiscal month under approval.
    pub fiscal_month: FiscalMonth,

    /// When the approval was opened.
    pub opened_at: DateTime<Utc>,
}

/// Data for ApprovalSubmitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalSubmittedData {
    /// Work-entry ids submitted with this month.
    pub entry_ids: Vec<AggregateId>,

    /// Absence ids submitted with this month.
    pub absence_ids: Vec<AggregateId>,

    /// Who submitted (the member, or a manager by proxy).
    pub submitted_by: MemberId,

    /// When the month was submitted.
    pub submitted_at: DateTime<Utc>,
}

/// Data for ApprovalApproved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalApprovedData {
    /// The reviewer who approved.
    pub approved_by: MemberId,

    /// When the month was approved.
    pub approved_at: DateTime<Utc>,
}

/// Data for ApprovalRejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRejectedData {
    /// The reviewer who rejected.
    pub rejected_by: MemberId,

    /// Why the month was rejected.
    pub reason: String,

    /// When the month was rejected.
    pub rejected_at: DateTime<Utc>,
}

/// Data for ApprovalReopened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalReopenedData {
    /// The member who recalled the submission.
    pub reopened_by: MemberId,

    /// When the month was reopened.
    pub reopened_at: DateTime<Utc>,
}

// Convenience constructors for events
impl ApprovalEvent {
    /// Creates an ApprovalOpened event.
    pub fn opened(approval_id: AggregateId, member_id: MemberId, fiscal_month: FiscalMonth) -> Self {
        ApprovalEvent::ApprovalOpened(ApprovalOpenedData {
            approval_id,
            member_id,
            fiscal_month,
            opened_at: Utc::now(),
        })
    }

    /// Creates an ApprovalSubmitted event.
    pub fn submitted(
        entry_ids: Vec<AggregateId>,
        absence_ids: Vec<AggregateId>,
        submitted_by: MemberId,
    ) -> Self {
        ApprovalEvent::ApprovalSubmitted(ApprovalSubmittedData {
            entry_ids,
            absence_ids,
            submitted_by,
            submitted_at: Utc::now(),
        })
    }

    /// Creates an ApprovalApproved event.
    pub fn approved(approved_by: MemberId) -> Self {
        ApprovalEvent::ApprovalApproved(ApprovalApprovedData {
            approved_by,
            approved_at: Utc::now(),
        })
    }

    /// Creates an ApprovalRejected event.
    pub fn rejected(rejected_by: MemberId, reason: impl Into<String>) -> Self {
        ApprovalEvent::ApprovalRejected(ApprovalRejectedData {
            rejected_by,
            reason: reason.into(),
            rejected_at: Utc::now(),
        })
    }

    /// Creates an ApprovalReopened event.
    pub fn reopened(reopened_by: MemberId) -> Self {
        ApprovalEvent::ApprovalReopened(ApprovalReopenedData {
            reopened_by,
            reopened_at: Utc::now(),
        })
    }
}
