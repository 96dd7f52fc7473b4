//! Daily attendance records embedded in an account.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// One gym visit. At most one per account per UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub clock_in: Timestamp,
    pub clock_out: Option<Timestamp>,
}

impl AttendanceRecord {
    pub fn open(now: Timestamp) -> Self {
        Self {
            date: now.date(),
            clock_in: now,
            clock_out: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }

    /// True when the clock-in falls inside `[from, to]`.
    pub fn clocked_in_between(&self, from: Timestamp, to: Timestamp) -> bool {
        !self.clock_in.is_before(&from) && !self.clock_in.is_after(&to)
    }
}
