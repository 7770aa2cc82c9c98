//! Absence aggregate and related types.

mod aggregate;
mod events;
mod state;

pub use aggregate::Absence;
pub use events::{
    AbsenceApprovedData, AbsenceDeletedData, AbsenceEvent, AbsenceRecalledData,
    AbsenceRecordedData, AbsenceRejectedData, AbsenceSubmittedData, AbsenceUpdatedData,
};
pub use state::{AbsenceStatus, AbsenceType};

use thiserror::Error;

/// Maximum length of an absence reason.
pub const MAX_REASON_LEN: usize = 500;

/// Errors that can occur during absence operations.
#[derive(Debug, Error)]
pub enum AbsenceError {
    /// The absence has already been recorded.
    #[error("Absence already recorded")]
    AlreadyRecorded,

    /// The absence date lies in the future.
    #[error("Absence date {date} is in the future")]
    DateInFuture { date: chrono::NaiveDate },

    /// The reason exceeds the maximum length.
    #[error("Reason too long: {length} chars (max {MAX_REASON_LEN})")]
    ReasonTooLong { length: usize },

    /// The absence cannot be edited in its current status.
    #[error("Absence is not editable in {status} status")]
    NotEditable { status: AbsenceStatus },

    /// The absence cannot be deleted in its current status.
    #[error("Absence is not deletable in {status} status")]
    NotDeletable { status: AbsenceStatus },

    /// The requested transition is illegal for the current status.
    #[error("Invalid status transition: cannot {action} from {current_status} status")]
    InvalidStatusTransition {
        current_status: AbsenceStatus,
        action: &'static str,
    },
}

impl AbsenceError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AbsenceError::AlreadyRecorded => "ALREADY_RECORDED",
            AbsenceError::DateInFuture { .. } => "DATE_IN_FUTURE",
            AbsenceError::ReasonTooLong { .. } => "REASON_TOO_LONG",
            AbsenceError::NotEditable { .. } => "NOT_EDITABLE",
            AbsenceError::NotDeletable { .. } => "NOT_DELETABLE",
            AbsenceError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
        }
    }
}
