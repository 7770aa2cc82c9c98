//! Value objects shared by the time-reporting aggregates.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a member (an employee reporting time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(Uuid);

impl MemberId {
    /// Creates a new random member ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a member ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for MemberId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Unique identifier for a project that hours are booked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Creates a new random project ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a project ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ProjectId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Worked time in quarter-hour units to avoid floating point issues.
///
/// The quarter-hour grid is structural: a value that is not a multiple of
/// 0.25h cannot be represented. Range checks (positive, at most a day)
/// stay in the aggregate command methods.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Hours {
    quarters: i32,
}

impl Hours {
    /// Quarter-hour units in a full 24-hour day.
    pub const FULL_DAY_QUARTERS: i32 = 96;

    /// Creates hours from quarter-hour units (e.g., 33 = 8.25h).
    pub fn from_quarters(quarters: i32) -> Self {
        Self { quarters }
    }

    /// Creates hours from whole hours.
    pub fn from_hours(hours: i32) -> Self {
        Self { quarters: hours * 4 }
    }

    /// Returns zero hours.
    pub fn zero() -> Self {
        Self { quarters: 0 }
    }

    /// Returns the quarter-hour units.
    pub fn as_quarters(&self) -> i32 {
        self.quarters
    }

    /// Returns the value in hours as a float, for display purposes.
    pub fn as_hours_f64(&self) -> f64 {
        f64::from(self.quarters) / 4.0
    }

    /// Returns true if the value is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.quarters > 0
    }

    /// Returns true if the value exceeds a 24-hour day.
    pub fn exceeds_full_day(&self) -> bool {
        self.quarters > Self::FULL_DAY_QUARTERS
    }
}

impl std::ops::Add for Hours {
    type Output = Hours;

    fn add(self, rhs: Hours) -> Hours {
        Hours {
            quarters: self.quarters + rhs.quarters,
        }
    }
}

impl std::ops::Sub for Hours {
    type Output = Hours;

    fn sub(self, rhs: Hours) -> Hours {
        Hours {
            quarters: self.quarters - rhs.quarters,
        }
    }
}

impl std::iter::Sum for Hours {
    fn sum<I: Iterator<Item = Hours>>(iter: I) -> Hours {
        iter.fold(Hours::zero(), |acc, h| acc + h)
    }
}

impl std::fmt::Display for Hours {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}h", self.as_hours_f64())
    }
}

/// A fiscal month: the monthly approval window, not necessarily aligned
/// with the calendar month.
///
/// Fiscal month `(y, m)` covers `[start_day of month m, start_day of the
/// following month)`. With `start_day = 1` it is the calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FiscalMonth {
    pub year: i32,
    pub month: u32,
}

impl FiscalMonth {
    /// Creates a fiscal month for the given year and month (1-12).
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Returns the fiscal month containing `date` for the given start day.
    pub fn containing(date: NaiveDate, start_day: u32) -> Self {
        let day = start_day.clamp(1, 28);
        if date.day() >= day {
            Self::new(date.year(), date.month())
        } else if date.month() == 1 {
            Self::new(date.year() - 1, 12)
        } else {
            Self::new(date.year(), date.month() - 1)
        }
    }

    /// Returns the following fiscal month.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// Returns the `[start, end)` date window for the given start day.
    pub fn window(&self, start_day: u32) -> (NaiveDate, NaiveDate) {
        let day = start_day.clamp(1, 28);
        let start = NaiveDate::from_ymd_opt(self.year, self.month, day)
            .expect("fiscal start day is clamped to 1..=28");
        let next = self.next();
        let end = NaiveDate::from_ymd_opt(next.year, next.month, day)
            .expect("fiscal start day is clamped to 1..=28");
        (start, end)
    }

    /// Returns true if `date` falls within this fiscal month.
    pub fn contains(&self, date: NaiveDate, start_day: u32) -> bool {
        let (start, end) = self.window(start_day);
        date >= start && date < end
    }

    /// Iterates every date of the fiscal month in order.
    pub fn dates(&self, start_day: u32) -> impl Iterator<Item = NaiveDate> {
        let (start, end) = self.window(start_day);
        start.iter_days().take_while(move |d| *d < end)
    }
}

impl std::fmt::Display for FiscalMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
