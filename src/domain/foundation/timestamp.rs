//! Timestamp value object for immutable points in time.
//!
//! Month and year arithmetic is calendar-aware: adding a month to the 31st
//! lands on the last day of a shorter target month instead of drifting.

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the calendar date (UTC) this timestamp falls on.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Creates a new timestamp by adding the specified number of days.
    ///
    /// Negative values subtract days.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Adds calendar months, clamping the day to the end of a shorter month.
    ///
    /// Saturates at the maximum representable instant.
    pub fn add_months(&self, months: u32) -> Self {
        Self(
            self.0
                .checked_add_months(Months::new(months))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }

    /// Adds calendar years. Feb 29 maps to Feb 28 in non-leap years.
    pub fn add_years(&self, years: u32) -> Self {
        self.add_months(years.saturating_mul(12))
    }

    /// Moves back `secs` seconds, saturating at the minimum representable instant.
    pub fn minus_secs(&self, secs: u64) -> Self {
        let earlier = i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|back| self.0.checked_sub_signed(back));
        Self(earlier.unwrap_or(DateTime::<Utc>::MIN_UTC))
    }

    /// Midnight (00:00:00.000 UTC) of the given date.
    pub fn start_of_day(date: NaiveDate) -> Self {
        Self(date.and_time(NaiveTime::MIN).and_utc())
    }

    /// Last representable millisecond (23:59:59.999 UTC) of the given date.
    pub fn end_of_day(date: NaiveDate) -> Self {
        Self(date.and_time(NaiveTime::MIN).and_utc() + Duration::days(1) - Duration::milliseconds(1))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}
