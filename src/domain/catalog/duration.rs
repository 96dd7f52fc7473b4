//! Plan durations and their calendar semantics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{Timestamp, ValidationError};

/// How long a membership period bought with a plan lasts.
///
/// Wire codes are the human-readable strings the catalog has always used
/// (`"1 day"`, `"1 month"` ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanDuration {
    #[serde(rename = "1 day")]
    OneDay,
    #[serde(rename = "1 month")]
    OneMonth,
    #[serde(rename = "3 months")]
    ThreeMonths,
    #[serde(rename = "6 months")]
    SixMonths,
    #[serde(rename = "1 year")]
    OneYear,
}

impl PlanDuration {
    pub const ALL: [PlanDuration; 5] = [
        PlanDuration::OneDay,
        PlanDuration::OneMonth,
        PlanDuration::ThreeMonths,
        PlanDuration::SixMonths,
        PlanDuration::OneYear,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            PlanDuration::OneDay => "1 day",
            PlanDuration::OneMonth => "1 month",
            PlanDuration::ThreeMonths => "3 months",
            PlanDuration::SixMonths => "6 months",
            PlanDuration::OneYear => "1 year",
        }
    }

    /// Computes the end of a period starting at `start`.
    ///
    /// Months and years follow the calendar; a start on the 31st ends on the
    /// last day of a shorter target month.
    pub fn end_date(&self, start: Timestamp) -> Timestamp {
        match self {
            PlanDuration::OneDay => start.add_days(1),
            PlanDuration::OneMonth => start.add_months(1),
            PlanDuration::ThreeMonths => start.add_months(3),
            PlanDuration::SixMonths => start.add_months(6),
            PlanDuration::OneYear => start.add_years(1),
        }
    }
}

impl fmt::Display for PlanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PlanDuration {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PlanDuration::ALL
            .into_iter()
            .find(|d| d.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "duration",
                    format!(
                        "'{}' is not one of: 1 day, 1 month, 3 months, 6 months, 1 year",
                        s
                    ),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, TimeZone, Utc};
    use proptest::prelude::*;

    fn start(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap())
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn codes_parse_back() {
        for d in PlanDuration::ALL {
            assert_eq!(d.code().parse::<PlanDuration>().unwrap(), d);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        let err = "2 weeks".parse::<PlanDuration>().unwrap_err();
        assert_eq!(err.field(), "duration");
    }

    #[test]
    fn serde_uses_wire_codes() {
        let json = serde_json::to_string(&PlanDuration::ThreeMonths).unwrap();
        assert_eq!(json, "\"3 months\"");
        let back: PlanDuration = serde_json::from_str("\"1 year\"").unwrap();
        assert_eq!(back, PlanDuration::OneYear);
    }

    #[test]
    fn one_day_adds_24_hours() {
        let end = PlanDuration::OneDay.end_date(start(2024, 2, 28));
        assert_eq!(end.date(), ymd(2024, 2, 29));
    }

    #[test]
    fn month_end_start_clamps_in_leap_year() {
        assert_eq!(PlanDuration::OneMonth.end_date(start(2024, 1, 31)).date(), ymd(2024, 2, 29));
    }

    #[test]
    fn month_end_start_clamps_in_common_year() {
        assert_eq!(PlanDuration::OneMonth.end_date(start(2023, 1, 31)).date(), ymd(2023, 2, 28));
    }

    #[test]
    fn mid_month_start_keeps_day() {
        assert_eq!(PlanDuration::OneMonth.end_date(start(2024, 1, 15)).date(), ymd(2024, 2, 15));
        assert_eq!(PlanDuration::ThreeMonths.end_date(start(2024, 1, 15)).date(), ymd(2024, 4, 15));
        assert_eq!(PlanDuration::SixMonths.end_date(start(2024, 1, 15)).date(), ymd(2024, 7, 15));
        assert_eq!(PlanDuration::OneYear.end_date(start(2024, 1, 15)).date(), ymd(2025, 1, 15));
    }

    #[test]
    fn leap_day_plus_one_year_lands_on_feb_28() {
        assert_eq!(PlanDuration::OneYear.end_date(start(2024, 2, 29)).date(), ymd(2025, 2, 28));
    }

    proptest! {
        #[test]
        fn end_is_always_after_start(days in 0i64..20_000, idx in 0usize..5) {
            let s = start(2000, 1, 1).add_days(days);
            let d = PlanDuration::ALL[idx];
            prop_assert!(d.end_date(s).is_after(&s));
        }

        #[test]
        fn month_durations_never_overshoot_target_month(days in 0i64..20_000) {
            let s = start(2000, 1, 1).add_days(days);
            let e = PlanDuration::OneMonth.end_date(s);
            let expected_month = s.as_datetime().month() % 12 + 1;
            prop_assert_eq!(e.as_datetime().month(), expected_month);
            prop_assert!(e.as_datetime().day() <= s.as_datetime().day());
        }
    }
}
