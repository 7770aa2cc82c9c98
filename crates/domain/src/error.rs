//! Domain error types.

use event_store::EventStoreError;
use thiserror::Error;

use crate::absence::AbsenceError;
use crate::approval::ApprovalError;
use crate::worklog::WorkEntryError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// A work-entry command was rejected by the aggregate.
    #[error("Work entry error: {0}")]
    WorkEntry(#[from] WorkEntryError),

    /// An absence command was rejected by the aggregate.
    #[error("Absence error: {0}")]
    Absence(#[from] AbsenceError),

    /// A monthly-approval command was rejected by the aggregate.
    #[error("Approval error: {0}")]
    Approval(#[from] ApprovalError),

    /// Aggregate not found (no events, or logically deleted).
    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    AggregateNotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },

    /// Serialization error. During replay this is fatal: it signals an
    /// event type the aggregate does not know.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
