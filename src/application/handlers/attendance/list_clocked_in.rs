//! ListClockedInHandler - Query handler for the attendance report.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::foundation::{AccountId, Timestamp};
use crate::domain::membership::{AttendanceError, AttendanceRecord};
use crate::ports::AccountRepository;

/// Inclusive range of UTC calendar days.
#[derive(Debug, Clone)]
pub struct ListClockedInQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockedInMember {
    pub account_id: AccountId,
    pub username: String,
    pub full_name: String,
    pub attendance: Vec<AttendanceRecord>,
}

pub struct ListClockedInHandler {
    accounts: Arc<dyn AccountRepository>,
}

impl ListClockedInHandler {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    /// Members with a clock-in between `from` 00:00 and `to` 23:59:59.999.
    pub async fn handle(&self, query: ListClockedInQuery) -> Result<Vec<ClockedInMember>, AttendanceError> {
        if query.from > query.to {
            return Err(AttendanceError::InvalidRange {
                from: query.from,
                to: query.to,
            });
        }
        let from = Timestamp::start_of_day(query.from);
        let to = Timestamp::end_of_day(query.to);

        let accounts = self.accounts.find_clocked_in_between(from, to).await?;
        Ok(accounts
            .into_iter()
            .map(|a| ClockedInMember {
                attendance: a.attendance_between(from, to),
                account_id: a.id,
                username: a.username,
                full_name: a.full_name,
            })
            .filter(|m| !m.attendance.is_empty())
            .collect())
    }
}
