//! Domain layer for the time-reporting core.
//!
//! This crate provides:
//! - [`Aggregate`] and [`DomainEvent`] traits for event-sourced entities
//! - [`Repository`] for reconstitution (snapshot + delta replay) and
//!   persistence with optimistic concurrency
//! - The work-entry, absence, and monthly-approval aggregates with their
//!   state machines and field-level invariants

pub mod absence;
pub mod aggregate;
pub mod approval;
pub mod error;
pub mod repository;
pub mod values;
pub mod worklog;

pub use absence::{Absence, AbsenceError, AbsenceEvent, AbsenceStatus, AbsenceType};
pub use aggregate::{Aggregate, DomainEvent, SnapshotCapable};
pub use approval::{ApprovalError, ApprovalEvent, ApprovalStatus, MonthlyApproval};
pub use error::DomainError;
pub use repository::{CommandResult, Repository};
pub use values::{FiscalMonth, Hours, MemberId, ProjectId};
pub use worklog::{EntryStatus, WorkEntry, WorkEntryError, WorkEntryEvent};
