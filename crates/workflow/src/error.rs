//! Workflow error types.

use chrono::NaiveDate;
use common::AggregateId;
use domain::{DomainError, FiscalMonth, Hours, MemberId, ProjectId};
use event_store::EventStoreError;
use projections::ProjectionError;
use thiserror::Error;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The actor is neither the member nor one of the member's managers.
    #[error("Proxy entry not allowed for member {member_id}")]
    ProxyEntryNotAllowed { member_id: MemberId },

    /// Only the member themselves may recall a submission.
    #[error("Recall not allowed: only member {member_id} may recall their own submission")]
    RecallNotAllowed { member_id: MemberId },

    /// The member's booked hours for the day would exceed 24h.
    #[error(
        "Daily limit exceeded for member {member_id} on {work_date}: {existing} already booked, {requested} requested"
    )]
    DailyLimitExceeded {
        member_id: MemberId,
        work_date: NaiveDate,
        existing: Hours,
        requested: Hours,
    },

    /// The member already has an entry for this project and date.
    #[error("Duplicate entry for member {member_id}, project {project_id}, date {work_date}")]
    DuplicateEntry {
        member_id: MemberId,
        project_id: ProjectId,
        work_date: NaiveDate,
    },

    /// A rejection requires a non-blank reason.
    #[error("Rejection reason is required")]
    ReasonRequired,

    /// The rejection reason exceeds the maximum length.
    #[error("Rejection reason too long: {length} chars (max {max})")]
    ReasonTooLong { length: usize, max: usize },

    /// No entries or absences matched the requested window and status.
    #[error("No entries to {action} for member {member_id}")]
    NoMatchingEntries {
        member_id: MemberId,
        action: &'static str,
    },

    /// No monthly approval exists for the member and fiscal month.
    #[error("No monthly approval for member {member_id} in {fiscal_month}")]
    ApprovalNotFound {
        member_id: MemberId,
        fiscal_month: FiscalMonth,
    },

    /// The work entry does not exist (or was deleted).
    #[error("Work entry not found: {0}")]
    EntryNotFound(AggregateId),

    /// The absence does not exist (or was deleted).
    #[error("Absence not found: {0}")]
    AbsenceNotFound(AggregateId),

    /// The subordinate-relationship lookup failed.
    #[error("Org directory error: {0}")]
    Directory(String),

    /// The audit sink rejected a write. Callers never see this from the
    /// orchestrator; audit failures are logged and swallowed.
    #[error("Audit log error: {0}")]
    Audit(String),

    /// Domain error (aggregate validation or state violation).
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Event store error, including optimistic-lock conflicts. The caller
    /// must reload and retry on a conflict; the workflow never retries.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// Projection error.
    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WorkflowError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::ProxyEntryNotAllowed { .. } => "PROXY_ENTRY_NOT_ALLOWED",
            WorkflowError::RecallNotAllowed { .. } => "RECALL_NOT_ALLOWED",
            WorkflowError::DailyLimitExceeded { .. } => "DAILY_LIMIT_EXCEEDED",
            WorkflowError::DuplicateEntry { .. } => "DUPLICATE_ENTRY",
            WorkflowError::ReasonRequired => "REASON_REQUIRED",
            WorkflowError::ReasonTooLong { .. } => "REASON_TOO_LONG",
            WorkflowError::NoMatchingEntries { .. } => "NO_MATCHING_ENTRIES",
            WorkflowError::ApprovalNotFound { .. } => "APPROVAL_NOT_FOUND",
            WorkflowError::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            WorkflowError::AbsenceNotFound(_) => "ABSENCE_NOT_FOUND",
            WorkflowError::Directory(_) => "ORG_DIRECTORY_ERROR",
            WorkflowError::Audit(_) => "AUDIT_ERROR",
            WorkflowError::Domain(DomainError::WorkEntry(e)) => e.code(),
            WorkflowError::Domain(DomainError::Absence(e)) => e.code(),
            WorkflowError::Domain(DomainError::Approval(e)) => e.code(),
            WorkflowError::Domain(_) => "DOMAIN_ERROR",
            WorkflowError::EventStore(EventStoreError::ConcurrencyConflict { .. }) => {
                "CONCURRENCY_CONFLICT"
            }
            WorkflowError::EventStore(_) => "EVENT_STORE_ERROR",
            WorkflowError::Projection(_) => "PROJECTION_ERROR",
            WorkflowError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Result type for workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;
