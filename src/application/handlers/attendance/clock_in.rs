//! ClockInHandler - Command handler for recording a gym visit.

use std::sync::Arc;

use crate::domain::foundation::{AccountId, Timestamp};
use crate::domain::membership::{AttendanceError, AttendanceRecord};
use crate::ports::AccountRepository;

#[derive(Debug, Clone)]
pub struct ClockInCommand {
    pub account_id: AccountId,
    pub at: Timestamp,
}

/// Opens the member's attendance record for the current UTC day.
pub struct ClockInHandler {
    accounts: Arc<dyn AccountRepository>,
}

impl ClockInHandler {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    pub async fn handle(&self, cmd: ClockInCommand) -> Result<AttendanceRecord, AttendanceError> {
        let mut account = self
            .accounts
            .find_by_id(&cmd.account_id)
            .await?
            .ok_or(AttendanceError::AccountNotFound(cmd.account_id))?;

        let record = account.clock_in(cmd.at)?.clone();
        self.accounts.update(&account).await?;

        tracing::info!(account_id = %account.id, date = %record.date, "Clocked in");
        Ok(record)
    }
}
