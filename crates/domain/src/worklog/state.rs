//! Work-entry state machine.

use serde::{Deserialize, Serialize};

/// The status of a work-log entry in its lifecycle.
///
/// State transitions:
/// ```text
/// Draft ──submit──► Submitted ──approve──► Approved (terminal)
///   ▲                   │
///   └──reject/recall────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EntryStatus {
    /// Entry is editable by its member.
    #[default]
    Draft,

    /// Entry has been submitted and awaits review.
    Submitted,

    /// Entry has been approved; permanently read-only (terminal state).
    Approved,
}

impl EntryStatus {
    /// Returns true if the entry fields may be edited in this status.
    pub fn can_edit(&self) -> bool {
        matches!(self, EntryStatus::Draft)
    }

    /// Returns true if the entry may be deleted in this status.
    pub fn can_delete(&self) -> bool {
        matches!(self, EntryStatus::Draft)
    }

    /// Returns true if the entry may be submitted in this status.
    pub fn can_submit(&self) -> bool {
        matches!(self, EntryStatus::Draft)
    }

    /// Returns true if the entry may be approved in this status.
    pub fn can_approve(&self) -> bool {
        matches!(self, EntryStatus::Submitted)
    }

    /// Returns true if the entry may be rejected back to draft.
    pub fn can_reject(&self) -> bool {
        matches!(self, EntryStatus::Submitted)
    }

    /// Returns true if the member may recall the entry.
    pub fn can_recall(&self) -> bool {
        matches!(self, EntryStatus::Submitted)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EntryStatus::Approved)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Draft => "Draft",
            EntryStatus::Submitted => "Submitted",
            EntryStatus::Approved => "Approved",
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
