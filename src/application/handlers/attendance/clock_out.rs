//! ClockOutHandler - Command handler for closing today's gym visit.

use std::sync::Arc;

use crate::domain::foundation::{AccountId, Timestamp};
use crate::domain::membership::{AttendanceError, AttendanceRecord};
use crate::ports::AccountRepository;

#[derive(Debug, Clone)]
pub struct ClockOutCommand {
    pub account_id: AccountId,
    pub at: Timestamp,
}

pub struct ClockOutHandler {
    accounts: Arc<dyn AccountRepository>,
}

impl ClockOutHandler {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    pub async fn handle(&self, cmd: ClockOutCommand) -> Result<AttendanceRecord, AttendanceError> {
        let mut account = self
            .accounts
            .find_by_id(&cmd.account_id)
            .await?
            .ok_or(AttendanceError::AccountNotFound(cmd.account_id))?;

        let record = account.clock_out(cmd.at)?.clone();
        self.accounts.update(&account).await?;

        tracing::info!(account_id = %account.id, date = %record.date, "Clocked out");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryAccountRepository;
    use crate::application::handlers::attendance::{ClockInCommand, ClockInHandler};
    use crate::domain::foundation::PlanId;
    use crate::domain::membership::Account;

    async fn clocked_in_member(repo: &InMemoryAccountRepository, now: Timestamp) -> Account {
        let mut account = Account::register(AccountId::new(), "ada", "ada@example.com", "Ada", None).unwrap();
        account.grant_period(PlanId::new(), now.add_days(-1), now.add_days(30));
        repo.insert(&account).await.unwrap();
        ClockInHandler::new(Arc::new(repo.clone()))
            .handle(ClockInCommand { account_id: account.id, at: now })
            .await
            .unwrap();
        account
    }

    #[tokio::test]
    async fn closes_todays_record_once() {
        let repo = InMemoryAccountRepository::new();
        let now = Timestamp::now();
        let account = clocked_in_member(&repo, now).await;
        let handler = ClockOutHandler::new(Arc::new(repo.clone()));

        let record = handler
            .handle(ClockOutCommand { account_id: account.id, at: now })
            .await
            .unwrap();
        assert_eq!(record.clock_out, Some(now));

        let err = handler
            .handle(ClockOutCommand { account_id: account.id, at: now })
            .await
            .unwrap_err();
        assert_eq!(err, AttendanceError::AlreadyClockedOut(now.date()));
    }

    #[tokio::test]
    async fn clock_out_without_clock_in_fails() {
        let repo = InMemoryAccountRepository::new();
        let account = Account::register(AccountId::new(), "ada", "ada@example.com", "Ada", None).unwrap();
        repo.insert(&account).await.unwrap();
        let now = Timestamp::now();

        let err = ClockOutHandler::new(Arc::new(repo))
            .handle(ClockOutCommand { account_id: account.id, at: now })
            .await
            .unwrap_err();
        assert_eq!(err, AttendanceError::NotClockedIn(now.date()));
    }
}
