//! Audit log trait and in-memory implementation.
//!
//! Audit writes are committed independently of the primary command; a
//! failure here is logged and swallowed, never propagated.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::MemberId;

use crate::error::WorkflowError;

/// One audited workflow action.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// Who performed the action.
    pub actor: MemberId,

    /// The action name (e.g., "submit_day", "approve_month").
    pub action: String,

    /// The member whose records were affected.
    pub member_id: MemberId,

    /// Free-text detail (window, counts, reason).
    pub detail: String,

    /// When the action happened.
    pub occurred_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an audit entry stamped with the current time.
    pub fn new(
        actor: MemberId,
        action: impl Into<String>,
        member_id: MemberId,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            actor,
            action: action.into(),
            member_id,
            detail: detail.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Trait for recording audited workflow actions.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Records one audit entry.
    async fn record(&self, entry: AuditEntry) -> Result<(), WorkflowError>;
}

#[derive(Debug, Default)]
struct InMemoryAuditState {
    entries: Vec<AuditEntry>,
    fail_on_record: bool,
}

/// In-memory audit log for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLog {
    state: Arc<RwLock<InMemoryAuditState>>,
}

impl InMemoryAuditLog {
    /// Creates a new empty audit log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the log to fail on subsequent record calls.
    pub fn set_fail_on_record(&self, fail: bool) {
        self.state.write().unwrap().fail_on_record = fail;
    }

    /// Returns the number of recorded entries.
    pub fn entry_count(&self) -> usize {
        self.state.read().unwrap().entries.len()
    }

    /// Returns a copy of all recorded entries.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.state.read().unwrap().entries.clone()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn record(&self, entry: AuditEntry) -> Result<(), WorkflowError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_record {
            return Err(WorkflowError::Audit("audit sink unavailable".to_string()));
        }

        state.entries.push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_entries() {
        let log = InMemoryAuditLog::new();
        let actor = MemberId::new();

        log.record(AuditEntry::new(actor, "submit_day", actor, "3 entries"))
            .await
            .unwrap();

        assert_eq!(log.entry_count(), 1);
        assert_eq!(log.entries()[0].action, "submit_day");
    }

    #[tokio::test]
    async fn fail_toggle_makes_record_fail() {
        let log = InMemoryAuditLog::new();
        log.set_fail_on_record(true);

        let actor = MemberId::new();
        let result = log
            .record(AuditEntry::new(actor, "submit_day", actor, ""))
            .await;

        assert!(result.is_err());
        assert_eq!(log.entry_count(), 0);
    }
}
