//! Monthly approval aggregate and related types.

mod aggregate;
mod events;
mod state;

pub use aggregate::MonthlyApproval;
pub use events::{
    ApprovalApprovedData, ApprovalEvent, ApprovalOpenedData, ApprovalRejectedData,
    ApprovalReopenedData, ApprovalSubmittedData,
};
pub use state::ApprovalStatus;

use thiserror::Error;

/// Errors that can occur during monthly-approval operations.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// The approval has already been opened.
    #[error("Monthly approval already opened")]
    AlreadyOpened,

    /// The requested transition is illegal for the current status.
    #[error("Invalid status transition: cannot {action} from {current_status} status")]
    InvalidStatusTransition {
        current_status: ApprovalStatus,
        action: &'static str,
    },
}

impl ApprovalError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ApprovalError::AlreadyOpened => "ALREADY_OPENED",
            ApprovalError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
        }
    }
}
