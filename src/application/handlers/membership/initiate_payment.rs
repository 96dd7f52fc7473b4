//! InitiatePaymentHandler - Command handler for starting a plan checkout.

use std::sync::Arc;

use crate::domain::foundation::{AccountId, PaymentId, PlanId, Timestamp};
use crate::domain::membership::MembershipError;
use crate::domain::payment::PaymentRecord;
use crate::ports::{AccountRepository, CustomerDetails, PaymentGateway, PaymentLinkRequest, PaymentRepository, PlanRepository};

/// Command to start paying for a plan.
#[derive(Debug, Clone)]
pub struct InitiatePaymentCommand {
    pub account_id: AccountId,
    pub plan_id: PlanId,
}

/// Result of a successful initiation.
#[derive(Debug, Clone)]
pub struct InitiatePaymentResult {
    pub payment_id: PaymentId,
    pub payment_link: String,
}

/// Handler for starting a payment.
///
/// Records a pending payment before asking the gateway for a checkout link,
/// so every link the member can follow has a ledger row to settle.
pub struct InitiatePaymentHandler {
    accounts: Arc<dyn AccountRepository>,
    plans: Arc<dyn PlanRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl InitiatePaymentHandler {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        plans: Arc<dyn PlanRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            accounts,
            plans,
            payments,
            gateway,
        }
    }

    pub async fn handle(&self, cmd: InitiatePaymentCommand) -> Result<InitiatePaymentResult, MembershipError> {
        let account = self
            .accounts
            .find_by_id(&cmd.account_id)
            .await?
            .ok_or_else(|| MembershipError::account_not_found(cmd.account_id))?;

        let plan = self
            .plans
            .find_by_id(&cmd.plan_id)
            .await?
            .ok_or_else(|| MembershipError::plan_not_found(cmd.plan_id))?;

        let record = PaymentRecord::initiate(PaymentId::new(), account.id, &plan, Timestamp::now());
        self.payments.insert(&record).await?;

        let request = PaymentLinkRequest {
            tx_ref: record.id,
            amount: record.amount,
            customer: CustomerDetails {
                email: account.email.clone(),
                phone_number: account.phone_number.clone(),
                name: account.full_name.clone(),
            },
            description: plan.name.clone(),
        };

        // The record stays pending on failure; the sweeper fails it after the TTL.
        let link = self.gateway.create_payment_link(request).await.map_err(|e| {
            tracing::warn!(payment_id = %record.id, error = %e, "Gateway refused checkout link");
            MembershipError::from(e)
        })?;

        tracing::info!(
            payment_id = %record.id,
            account_id = %account.id,
            plan_id = %plan.id,
            amount = record.amount,
            "Payment initiated"
        );

        Ok(InitiatePaymentResult {
            payment_id: record.id,
            payment_link: link.url,
        })
    }
}
