//! Workflow configuration loaded from environment variables.

use domain::Hours;

/// Workflow configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `FISCAL_MONTH_START_DAY` — first day of the fiscal month, 1-28
///   (default: `1`, calendar-month aligned)
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// First day of the fiscal month (1-28).
    pub fiscal_month_start_day: u32,

    /// Maximum total hours a member may book on one day.
    pub daily_limit: Hours,
}

impl WorkflowConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let fiscal_month_start_day = std::env::var("FISCAL_MONTH_START_DAY")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(|day: u32| day.clamp(1, 28))
            .unwrap_or(1);

        Self {
            fiscal_month_start_day,
            ..Self::default()
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            fiscal_month_start_day: 1,
            daily_limit: Hours::from_hours(24),
        }
    }
}
