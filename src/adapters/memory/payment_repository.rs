//! In-memory payment ledger.
//!
//! Conditional settlement runs under the write lock, which gives the same
//! all-or-nothing behaviour as the `WHERE status = 'pending'` update in SQL.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{AccountId, DomainError, PaymentId, Timestamp};
use crate::domain::payment::{GatewayMetadata, PaymentRecord};
use crate::ports::{PaymentRepository, SettleOutcome};

#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentRepository {
    payments: Arc<RwLock<HashMap<PaymentId, PaymentRecord>>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &PaymentId) -> Option<PaymentRecord> {
        self.payments.read().await.get(id).cloned()
    }

    async fn settle_with(
        &self,
        id: &PaymentId,
        apply: impl FnOnce(&mut PaymentRecord) -> Result<(), DomainError> + Send,
    ) -> Result<SettleOutcome, DomainError> {
        let mut payments = self.payments.write().await;
        let Some(record) = payments.get_mut(id) else {
            return Ok(SettleOutcome::NotFound);
        };
        if !record.is_pending() {
            return Ok(SettleOutcome::AlreadySettled(record.clone()));
        }
        apply(record)?;
        Ok(SettleOutcome::Applied)
    }
}

fn newest_first(mut records: Vec<PaymentRecord>) -> Vec<PaymentRecord> {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn insert(&self, record: &PaymentRecord) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&record.id) {
            return Err(DomainError::validation("id", "Payment already exists"));
        }
        payments.insert(record.id, record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<PaymentRecord>, DomainError> {
        Ok(self.get(id).await)
    }

    async fn find_by_account(&self, account_id: &AccountId) -> Result<Vec<PaymentRecord>, DomainError> {
        let records = self
            .payments
            .read()
            .await
            .values()
            .filter(|p| &p.account_id == account_id)
            .cloned()
            .collect();
        Ok(newest_first(records))
    }

    async fn find_all(&self) -> Result<Vec<PaymentRecord>, DomainError> {
        let records = self.payments.read().await.values().cloned().collect();
        Ok(newest_first(records))
    }

    async fn find_pending_created_before(
        &self,
        created_before: Timestamp,
    ) -> Result<Vec<PaymentRecord>, DomainError> {
        Ok(self
            .payments
            .read()
            .await
            .values()
            .filter(|p| p.is_pending() && p.created_at.is_before(&created_before))
            .cloned()
            .collect())
    }

    async fn settle_success(
        &self,
        id: &PaymentId,
        metadata: &GatewayMetadata,
        at: Timestamp,
    ) -> Result<SettleOutcome, DomainError> {
        let metadata = metadata.clone();
        self.settle_with(id, move |record| record.mark_success(metadata, at)).await
    }

    async fn settle_failed(&self, id: &PaymentId, at: Timestamp) -> Result<SettleOutcome, DomainError> {
        self.settle_with(id, move |record| record.mark_failed(at)).await
    }
}
