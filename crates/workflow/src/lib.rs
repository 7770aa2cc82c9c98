//! Cross-aggregate approval workflow orchestration.
//!
//! The [`ApprovalOrchestrator`] coordinates submit/approve/reject/recall
//! across every work-entry and absence aggregate in a day or fiscal-month
//! window, enforcing proxy-entry authorization and the daily 24-hour cap,
//! and committing each cascade atomically through the event store.

pub mod commands;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod services;

pub use commands::{
    ApproveDay, ApproveMonth, DeleteAbsence, DeleteEntry, RecallDay, RecallMonth, RecordAbsence,
    RecordEntry, RejectDay, RejectMonth, SubmitDay, SubmitMonth, UpdateAbsence, UpdateEntry,
};
pub use config::WorkflowConfig;
pub use error::{Result, WorkflowError};
pub use orchestrator::{ApprovalOrchestrator, CascadeOutcome};
pub use services::audit::{AuditEntry, AuditLog, InMemoryAuditLog};
pub use services::org::{InMemoryOrgDirectory, OrgDirectory};
