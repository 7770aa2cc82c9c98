//! Monthly approval aggregate.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::values::{FiscalMonth, MemberId};

use super::{
    ApprovalError, ApprovalEvent, ApprovalStatus,
    events::{ApprovalOpenedData, ApprovalRejectedData, ApprovalSubmittedData},
};

/// Monthly approval aggregate root.
///
/// One aggregate per `(member, fiscal month)`, owning the set of entry and
/// absence ids submitted together for that month. The aggregate id is
/// derived deterministically from the key so that concurrent submitters
/// converge on the same event stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthlyApproval {
    /// Derived identifier, see [`MonthlyApproval::id_for`].
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// The member whose month this is.
    member_id: Option<MemberId>,

    /// The fiscal month under approval.
    fiscal_month: Option<FiscalMonth>,

    /// Work-entry ids included in the current submission.
    entry_ids: Vec<AggregateId>,

    /// Absence ids included in the current submission.
    absence_ids: Vec<AggregateId>,

    /// Current lifecycle status.
    status: ApprovalStatus,

    /// Who submitted the current submission.
    submitted_by: Option<MemberId>,

    /// When the current submission was made.
    submitted_at: Option<DateTime<Utc>>,

    /// Who made the approve/reject decision.
    decided_by: Option<MemberId>,

    /// The rejection reason, if the month was rejected.
    rejection_reason: Option<String>,
}

impl Aggregate for MonthlyApproval {
    type Event = ApprovalEvent;
    type Error = ApprovalError;

    fn aggregate_type() -> &'static str {
        "MonthlyApproval"
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

    fn apply(&mut self, event: Self::Event) {
        match event {
            ApprovalEvent::ApprovalOpened(data) => self.apply_opened(data),
            ApprovalEvent::ApprovalSubmitted(data) => self.apply_submitted(data),
            ApprovalEvent::ApprovalApproved(data) => {
                self.status = ApprovalStatus::Approved;
                self.decided_by = Some(data.approved_by);
            }
            ApprovalEvent::ApprovalRejected(data) => self.apply_rejected(data),
            ApprovalEvent::ApprovalReopened(_) => {
                self.status = ApprovalStatus::Pending;
                self.decided_by = None;
                self.rejection_reason = None;
            }
        }
    }
}

impl SnapshotCapable for MonthlyApproval {
    fn snapshot_interval() -> usize {
        20
    }
}

// Query methods
impl MonthlyApproval {
    /// Derives the aggregate id for a member's fiscal month.
    ///
    /// Deterministic: the same key always yields the same id.
    pub fn id_for(member_id: MemberId, fiscal_month: FiscalMonth) -> AggregateId {
        AggregateId::derived(&format!("monthly-approval:{member_id}:{fiscal_month}"))
    }

    /// Returns the member whose month this is.
    pub fn member_id(&self) -> Option<MemberId> {
        self.member_id
    }

    /// Returns the fiscal month under approval.
    pub fn fiscal_month(&self) -> Option<FiscalMonth> {
        self.fiscal_month
    }

    /// Returns the submitted work-entry ids.
    pub fn entry_ids(&self) -> &[AggregateId] {
        &self.entry_ids
    }

    /// Returns the submitted absence ids.
    pub fn absence_ids(&self) -> &[AggregateId] {
        &self.absence_ids
    }

    /// Returns the current status.
    pub fn status(&self) -> ApprovalStatus {
        self.status
    }

    /// Returns who submitted the current submission.
    pub fn submitted_by(&self) -> Option<MemberId> {
        self.submitted_by
    }

    /// Returns who decided the month, if decided.
    pub fn decided_by(&self) -> Option<MemberId> {
        self.decided_by
    }

    /// Returns the rejection reason, if the month was rejected.
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }
}

// Command methods (return events)
impl MonthlyApproval {
    /// Opens the approval record for a member's fiscal month.
    pub fn open(
        &self,
        approval_id: AggregateId,
        member_id: MemberId,
        fiscal_month: FiscalMonth,
    ) -> Result<Vec<ApprovalEvent>, ApprovalError> {
        if self.id.is_some() {
            return Err(ApprovalError::AlreadyOpened);
        }

        Ok(vec![ApprovalEvent::opened(approval_id, member_id, fiscal_month)])
    }

    /// Submits the month with the entry/absence ids it covers.
    ///
    /// Allowed from Pending and, for resubmission, from Rejected.
    pub fn submit(
        &self,
        entry_ids: Vec<AggregateId>,
        absence_ids: Vec<AggregateId>,
        submitted_by: MemberId,
    ) -> Result<Vec<ApprovalEvent>, ApprovalError> {
        if !self.status.can_submit() {
            return Err(ApprovalError::InvalidStatusTransition {
                current_status: self.status,
                action: "submit",
            });
        }

        Ok(vec![ApprovalEvent::submitted(entry_ids, absence_ids, submitted_by)])
    }

    /// Approves the month. Terminal.
    pub fn approve(&self, approved_by: MemberId) -> Result<Vec<ApprovalEvent>, ApprovalError> {
        if !self.status.can_approve() {
            return Err(ApprovalError::InvalidStatusTransition {
                current_status: self.status,
                action: "approve",
            });
        }

        Ok(vec![ApprovalEvent::approved(approved_by)])
    }

    /// Rejects the month.
    pub fn reject(
        &self,
        rejected_by: MemberId,
        reason: impl Into<String>,
    ) -> Result<Vec<ApprovalEvent>, ApprovalError> {
        if !self.status.can_reject() {
            return Err(ApprovalError::InvalidStatusTransition {
                current_status: self.status,
                action: "reject",
            });
        }

        Ok(vec![ApprovalEvent::rejected(rejected_by, reason)])
    }

    /// Reopens the month when the member recalls their submission.
    pub fn reopen(&self, reopened_by: MemberId) -> Result<Vec<ApprovalEvent>, ApprovalError> {
        if !self.status.can_reopen() {
            return Err(ApprovalError::InvalidStatusTransition {
                current_status: self.status,
                action: "reopen",
            });
        }

        Ok(vec![ApprovalEvent::reopened(reopened_by)])
    }
}

// Apply event helpers
impl MonthlyApproval {
    fn apply_opened(&mut self, data: ApprovalOpenedData) {
        self.id = Some(data.approval_id);
        self.member_id = Some(data.member_id);
        self.fiscal_month = Some(data.fiscal_month);
        self.status = ApprovalStatus::Pending;
    }

    fn apply_submitted(&mut self, data: ApprovalSubmittedData) {
        self.entry_ids = data.entry_ids;
        self.absence_ids = data.absence_ids;
        self.submitted_by = Some(data.submitted_by);
        self.submitted_at = Some(data.submitted_at);
        self.status = ApprovalStatus::Submitted;
        self.decided_by = None;
        self.rejection_reason = None;
    }

    fn apply_rejected(&mut self, data: ApprovalRejectedData) {
        self.status = ApprovalStatus::Rejected;
        self.decided_by = Some(data.rejected_by);
        self.rejection_reason = Some(data.reason);
    }
}
