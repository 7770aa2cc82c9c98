//! Org directory trait and in-memory implementation.
//!
//! The org chart lives outside the core; manager/subordinate lookups go
//! through this trait by member id, never through references stored in
//! aggregates.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::MemberId;

use crate::error::WorkflowError;

/// Trait for subordinate-relationship queries.
#[async_trait]
pub trait OrgDirectory: Send + Sync {
    /// Returns true if `manager` is a direct or indirect manager of
    /// `member`.
    async fn is_manager_of(&self, manager: MemberId, member: MemberId)
    -> Result<bool, WorkflowError>;
}

/// In-memory org directory for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrgDirectory {
    // member -> direct manager
    managers: Arc<RwLock<HashMap<MemberId, MemberId>>>,
}

impl InMemoryOrgDirectory {
    /// Creates a new empty org directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a member's direct manager.
    pub fn set_manager(&self, member: MemberId, manager: MemberId) {
        self.managers.write().unwrap().insert(member, manager);
    }
}

#[async_trait]
impl OrgDirectory for InMemoryOrgDirectory {
    async fn is_manager_of(
        &self,
        manager: MemberId,
        member: MemberId,
    ) -> Result<bool, WorkflowError> {
        let managers = self.managers.read().unwrap();

        // Walk up the chain; a visited set guards against cyclic data.
        let mut seen = HashSet::new();
        let mut current = member;
        while let Some(&next) = managers.get(&current) {
            if next == manager {
                return Ok(true);
            }
            if !seen.insert(next) {
                break;
            }
            current = next;
        }

        Ok(false)
    }
}
