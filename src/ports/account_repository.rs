//! Account repository port.
//!
//! Accounts are persisted as one document each, membership periods and
//! attendance included, guarded by an optimistic `version` column.
//!
//! # Example
//!
//! ```ignore
//! let mut account = repo.find_by_id(&id).await?.ok_or(...)?;
//! account.expire_periods(now);
//! match repo.update(&account).await {
//!     Err(e) if e.is_concurrent_modification() => { /* re-read and retry */ }
//!     other => other?,
//! }
//! ```

use async_trait::async_trait;

use crate::domain::foundation::{AccountId, DomainError, PlanId, Timestamp};
use crate::domain::membership::Account;

/// Repository port for Account aggregate persistence.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Save a new account.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the id or username is already taken
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, account: &Account) -> Result<(), DomainError>;

    /// Write back an account read earlier.
    ///
    /// Succeeds only if the stored version still equals `account.version`;
    /// the stored version is then incremented.
    ///
    /// # Errors
    ///
    /// - `ConcurrentModification` if another writer got there first
    /// - `AccountNotFound` if the account was removed
    /// - `DatabaseError` on persistence failure
    async fn update(&self, account: &Account) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError>;

    /// Ids of accounts holding at least one active period.
    async fn find_ids_with_active_periods(&self) -> Result<Vec<AccountId>, DomainError>;

    /// Accounts holding any period (active or not) for `plan_id`.
    async fn find_by_plan(&self, plan_id: &PlanId) -> Result<Vec<Account>, DomainError>;

    /// Accounts with at least one clock-in inside `[from, to]`.
    async fn find_clocked_in_between(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<Account>, DomainError>;
}
