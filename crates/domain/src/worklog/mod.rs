//! Work-log entry aggregate and related types.

mod aggregate;
mod events;
mod state;

pub use aggregate::WorkEntry;
pub use events::{
    EntryApprovedData, EntryDeletedData, EntryRecalledData, EntryRecordedData, EntryRejectedData,
    EntrySubmittedData, EntryUpdatedData, WorkEntryEvent,
};
pub use state::EntryStatus;

use thiserror::Error;

use crate::values::Hours;

/// Maximum length of a work-entry comment.
pub const MAX_COMMENT_LEN: usize = 500;

/// Errors that can occur during work-entry operations.
#[derive(Debug, Error)]
pub enum WorkEntryError {
    /// The entry has already been recorded.
    #[error("Entry already recorded")]
    AlreadyRecorded,

    /// Hours must be a positive quarter-hour value of at most 24h.
    #[error("Invalid hours: {hours} (must be positive and at most 24h)")]
    InvalidHours { hours: Hours },

    /// The work date lies in the future.
    #[error("Work date {date} is in the future")]
    DateInFuture { date: chrono::NaiveDate },

    /// The comment exceeds the maximum length.
    #[error("Comment too long: {length} chars (max {MAX_COMMENT_LEN})")]
    CommentTooLong { length: usize },

    /// The entry cannot be edited in its current status.
    #[error("Entry is not editable in {status} status")]
    NotEditable { status: EntryStatus },

    /// The entry cannot be deleted in its current status.
    #[error("Entry is not deletable in {status} status")]
    NotDeletable { status: EntryStatus },

    /// The requested transition is illegal for the current status.
    #[error("Invalid status transition: cannot {action} from {current_status} status")]
    InvalidStatusTransition {
        current_status: EntryStatus,
        action: &'static str,
    },
}

impl WorkEntryError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            WorkEntryError::AlreadyRecorded => "ALREADY_RECORDED",
            WorkEntryError::InvalidHours { .. } => "INVALID_HOURS",
            WorkEntryError::DateInFuture { .. } => "DATE_IN_FUTURE",
            WorkEntryError::CommentTooLong { .. } => "COMMENT_TOO_LONG",
            WorkEntryError::NotEditable { .. } => "NOT_EDITABLE",
            WorkEntryError::NotDeletable { .. } => "NOT_DELETABLE",
            WorkEntryError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
        }
    }
}
