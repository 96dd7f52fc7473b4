//! Payment record repository port.
//!
//! Settling a payment is a compare-and-swap on its status: the write only
//! applies while the stored record is still `pending`. Two concurrent
//! callbacks for the same payment therefore cannot both settle it.

use async_trait::async_trait;

use crate::domain::foundation::{AccountId, DomainError, PaymentId, Timestamp};
use crate::domain::payment::{GatewayMetadata, PaymentRecord};

/// Result of a conditional status write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The record was pending and now carries the new status.
    Applied,
    /// The record had already left `pending`; holds what is stored now.
    AlreadySettled(PaymentRecord),
    NotFound,
}

/// Repository port for the payment ledger.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert(&self, record: &PaymentRecord) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<PaymentRecord>, DomainError>;

    /// Payments for one account, newest first.
    async fn find_by_account(&self, account_id: &AccountId) -> Result<Vec<PaymentRecord>, DomainError>;

    /// Every payment, newest first.
    async fn find_all(&self) -> Result<Vec<PaymentRecord>, DomainError>;

    /// Pending payments created before `created_before`.
    async fn find_pending_created_before(
        &self,
        created_before: Timestamp,
    ) -> Result<Vec<PaymentRecord>, DomainError>;

    /// `pending -> success`, storing gateway metadata, only if still pending.
    async fn settle_success(
        &self,
        id: &PaymentId,
        metadata: &GatewayMetadata,
        at: Timestamp,
    ) -> Result<SettleOutcome, DomainError>;

    /// `pending -> failed`, only if still pending.
    async fn settle_failed(&self, id: &PaymentId, at: Timestamp) -> Result<SettleOutcome, DomainError>;
}
