//! In-memory account repository.
//!
//! Mirrors the optimistic version check of the Postgres adapter so that
//! conflict handling can be exercised without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{AccountId, DomainError, ErrorCode, PlanId, Timestamp};
use crate::domain::membership::Account;
use crate::ports::AccountRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountRepository {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored account, bypassing the port (useful for tests).
    pub async fn get(&self, id: &AccountId) -> Option<Account> {
        self.accounts.read().await.get(id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn insert(&self, account: &Account) -> Result<(), DomainError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.id) {
            return Err(DomainError::validation("id", "Account already exists"));
        }
        if accounts.values().any(|a| a.username == account.username) {
            return Err(DomainError::validation("username", "Username already taken"));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<(), DomainError> {
        let mut accounts = self.accounts.write().await;
        let stored = accounts.get_mut(&account.id).ok_or_else(|| {
            DomainError::new(ErrorCode::AccountNotFound, "Account not found")
                .with_detail("id", account.id.to_string())
        })?;
        if stored.version != account.version {
            return Err(DomainError::new(
                ErrorCode::ConcurrentModification,
                format!(
                    "Account {} was modified concurrently (expected version {}, found {})",
                    account.id, account.version, stored.version
                ),
            ));
        }
        let mut next = account.clone();
        next.version += 1;
        *stored = next;
        Ok(())
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn find_ids_with_active_periods(&self) -> Result<Vec<AccountId>, DomainError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| a.has_active_period())
            .map(|a| a.id)
            .collect())
    }

    async fn find_by_plan(&self, plan_id: &PlanId) -> Result<Vec<Account>, DomainError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| a.period_for(*plan_id).is_some())
            .cloned()
            .collect())
    }

    async fn find_clocked_in_between(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<Account>, DomainError> {
        let mut found: Vec<Account> = self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| !a.attendance_between(from, to).is_empty())
            .cloned()
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(found)
    }
}
