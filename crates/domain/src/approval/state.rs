//! Monthly approval state machine.

use serde::{Deserialize, Serialize};

/// The status of a monthly approval in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──submit──► Submitted ──approve──► Approved (terminal)
///    ▲                    │
///    │◄──recall───────────┤
///    └──submit── Rejected ◄┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ApprovalStatus {
    /// The month is open; nothing submitted yet (or recalled).
    #[default]
    Pending,

    /// The month has been submitted and awaits a decision.
    Submitted,

    /// The month was approved (terminal state).
    Approved,

    /// The month was rejected; the member may resubmit.
    Rejected,
}

impl ApprovalStatus {
    /// Returns true if the month can be (re)submitted in this status.
    pub fn can_submit(&self) -> bool {
        matches!(self, ApprovalStatus::Pending | ApprovalStatus::Rejected)
    }

    /// Returns true if the month can be approved in this status.
    pub fn can_approve(&self) -> bool {
        matches!(self, ApprovalStatus::Submitted)
    }

    /// Returns true if the month can be rejected in this status.
    pub fn can_reject(&self) -> bool {
        matches!(self, ApprovalStatus::Submitted)
    }

    /// Returns true if the member can recall the submission.
    pub fn can_reopen(&self) -> bool {
        matches!(self, ApprovalStatus::Submitted)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApprovalStatus::Approved)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "Pending",
            ApprovalStatus::Submitted => "Submitted",
            ApprovalStatus::Approved => "Approved",
            ApprovalStatus::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
