//! Absence state machine and absence categories.

use serde::{Deserialize, Serialize};

/// The category of an absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbsenceType {
    PaidLeave,
    SickLeave,
    SpecialLeave,
    Other,
}

impl AbsenceType {
    /// Returns the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AbsenceType::PaidLeave => "PaidLeave",
            AbsenceType::SickLeave => "SickLeave",
            AbsenceType::SpecialLeave => "SpecialLeave",
            AbsenceType::Other => "Other",
        }
    }
}

impl std::fmt::Display for AbsenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The status of an absence in its lifecycle.
///
/// Unlike a work entry, a rejected absence lands in an explicit Rejected
/// state; editing or deleting it returns it to Draft.
///
/// State transitions:
/// ```text
/// Draft ──submit──► Submitted ──approve──► Approved (terminal)
///   ▲                   │
///   │◄──recall──────────┤
///   └──edit── Rejected ◄┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AbsenceStatus {
    /// Absence is editable by its member.
    #[default]
    Draft,

    /// Absence has been submitted and awaits review.
    Submitted,

    /// Absence has been approved; permanently read-only (terminal state).
    Approved,

    /// Absence was rejected by a reviewer; editable again.
    Rejected,
}

impl AbsenceStatus {
    /// Returns true if the absence fields may be edited in this status.
    pub fn can_edit(&self) -> bool {
        matches!(self, AbsenceStatus::Draft | AbsenceStatus::Rejected)
    }

    /// Returns true if the absence may be deleted in this status.
    pub fn can_delete(&self) -> bool {
        matches!(self, AbsenceStatus::Draft | AbsenceStatus::Rejected)
    }

    /// Returns true if the absence may be submitted in this status.
    pub fn can_submit(&self) -> bool {
        matches!(self, AbsenceStatus::Draft)
    }

    /// Returns true if the absence may be approved in this status.
    pub fn can_approve(&self) -> bool {
        matches!(self, AbsenceStatus::Submitted)
    }

    /// Returns true if the absence may be rejected in this status.
    pub fn can_reject(&self) -> bool {
        matches!(self, AbsenceStatus::Submitted)
    }

    /// Returns true if the member may recall the absence.
    pub fn can_recall(&self) -> bool {
        matches!(self, AbsenceStatus::Submitted)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AbsenceStatus::Approved)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AbsenceStatus::Draft => "Draft",
            AbsenceStatus::Submitted => "Submitted",
            AbsenceStatus::Approved => "Approved",
            AbsenceStatus::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for AbsenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
