//! GetPaymentHistoryHandler - Query handler for the payment ledger.
//!
//! Each payment row is joined with the plan it paid for and the account's
//! membership period for that plan, so the view reads like a statement.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::catalog::{PlanDuration, SubscriptionPlan};
use crate::domain::foundation::{AccountId, PaymentId, PlanId, Timestamp};
use crate::domain::membership::{Account, MembershipError};
use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::ports::{AccountRepository, PaymentRepository, PlanRepository};

/// Shown in place of a period status when the account holds no period for the plan.
pub const UNKNOWN_SUBSCRIPTION_STATUS: &str = "unknown";

/// Query for payment history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetPaymentHistoryQuery {
    ForAccount(AccountId),
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub id: PlanId,
    pub name: String,
    pub duration: PlanDuration,
    pub price: i64,
}

impl From<&SubscriptionPlan> for PlanSummary {
    fn from(plan: &SubscriptionPlan) -> Self {
        Self {
            id: plan.id,
            name: plan.name.clone(),
            duration: plan.duration,
            price: plan.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub id: AccountId,
    pub username: String,
    pub email: String,
}

/// One row of payment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentHistoryEntry {
    pub payment_id: PaymentId,
    pub amount: i64,
    pub status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub payment_method: Option<String>,
    /// Gateway transaction id, set once a callback settled the payment.
    pub transaction_id: Option<String>,
    pub transaction_date: Option<Timestamp>,
    pub created_at: Timestamp,
    /// `None` once the plan has been deleted.
    pub plan: Option<PlanSummary>,
    /// Only filled for the global history.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountSummary>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub subscription_status: String,
}

impl PaymentHistoryEntry {
    fn build(
        record: &PaymentRecord,
        plan: Option<&SubscriptionPlan>,
        account: Option<&Account>,
        with_account: bool,
    ) -> Self {
        let period = account.and_then(|a| a.period_for(record.plan_id));
        Self {
            payment_id: record.id,
            amount: record.amount,
            status: record.status,
            payment_reference: record.gateway.payment_reference.clone(),
            payment_method: record.gateway.payment_method.clone(),
            transaction_id: record.gateway.transaction_id.clone(),
            transaction_date: record.gateway.transaction_date,
            created_at: record.created_at,
            plan: plan.map(PlanSummary::from),
            account: account.filter(|_| with_account).map(|a| AccountSummary {
                id: a.id,
                username: a.username.clone(),
                email: a.email.clone(),
            }),
            start_date: period.map(|p| p.start_date),
            end_date: period.map(|p| p.end_date),
            subscription_status: period
                .map(|p| p.status.as_str().to_string())
                .unwrap_or_else(|| UNKNOWN_SUBSCRIPTION_STATUS.to_string()),
        }
    }
}

/// Handler for reading payment history, per account or across all accounts.
pub struct GetPaymentHistoryHandler {
    accounts: Arc<dyn AccountRepository>,
    plans: Arc<dyn PlanRepository>,
    payments: Arc<dyn PaymentRepository>,
}

impl GetPaymentHistoryHandler {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        plans: Arc<dyn PlanRepository>,
        payments: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self {
            accounts,
            plans,
            payments,
        }
    }

    /// Returns history newest first.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown account, or when there are no payments
    pub async fn handle(
        &self,
        query: GetPaymentHistoryQuery,
    ) -> Result<Vec<PaymentHistoryEntry>, MembershipError> {
        match query {
            GetPaymentHistoryQuery::ForAccount(account_id) => self.for_account(account_id).await,
            GetPaymentHistoryQuery::All => self.all().await,
        }
    }

    async fn for_account(&self, account_id: AccountId) -> Result<Vec<PaymentHistoryEntry>, MembershipError> {
        let account = self
            .accounts
            .find_by_id(&account_id)
            .await?
            .ok_or_else(|| MembershipError::account_not_found(account_id))?;

        let records = self.payments.find_by_account(&account_id).await?;
        if records.is_empty() {
            return Err(no_payments(account_id.to_string()));
        }

        let plans = self.load_plans(&records).await?;
        Ok(records
            .iter()
            .map(|r| PaymentHistoryEntry::build(r, plans.get(&r.plan_id), Some(&account), false))
            .collect())
    }

    async fn all(&self) -> Result<Vec<PaymentHistoryEntry>, MembershipError> {
        let records = self.payments.find_all().await?;
        if records.is_empty() {
            return Err(no_payments("all"));
        }

        let plans = self.load_plans(&records).await?;
        let mut accounts: HashMap<AccountId, Option<Account>> = HashMap::new();
        for record in &records {
            if !accounts.contains_key(&record.account_id) {
                let account = self.accounts.find_by_id(&record.account_id).await?;
                accounts.insert(record.account_id, account);
            }
        }

        Ok(records
            .iter()
            .map(|r| {
                let account = accounts.get(&r.account_id).and_then(Option::as_ref);
                PaymentHistoryEntry::build(r, plans.get(&r.plan_id), account, true)
            })
            .collect())
    }

    async fn load_plans(
        &self,
        records: &[PaymentRecord],
    ) -> Result<HashMap<PlanId, SubscriptionPlan>, MembershipError> {
        let mut plans = HashMap::new();
        for record in records {
            if plans.contains_key(&record.plan_id) {
                continue;
            }
            if let Some(plan) = self.plans.find_by_id(&record.plan_id).await? {
                plans.insert(record.plan_id, plan);
            }
        }
        Ok(plans)
    }
}

fn no_payments(scope: impl Into<String>) -> MembershipError {
    MembershipError::NotFound {
        entity: "payments",
        id: scope.into(),
    }
}
