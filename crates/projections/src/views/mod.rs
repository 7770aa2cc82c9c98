//! Read model views.

mod calendar;
mod rejection_log;

pub use calendar::{AbsenceSummary, EntrySummary, MemberCalendarView};
pub use rejection_log::{DailyRejection, DailyRejectionLogView};
