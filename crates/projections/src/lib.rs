//! Read-side views derived from the time-reporting event log.
//!
//! Views are denormalized, rebuildable, and never authoritative:
//! - [`Projection`] — processes events into a read model
//! - [`ReadModel`] — query access to denormalized data
//! - [`ProjectionProcessor`] — feeds events from the store to projections
//! - [`MemberCalendarView`] — per member/day entry and absence summaries,
//!   backing the workflow's window lookups and daily hour totals
//! - [`DailyRejectionLogView`] — one row per `(member, day)` rejection,
//!   upserted with latest-wins semantics

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{DailyRejection, DailyRejectionLogView, MemberCalendarView};
