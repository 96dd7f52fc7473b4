//! Payment record entity.
//!
//! One row per checkout attempt. The record id is the transaction reference
//! handed to the gateway, so a callback resolves back to exactly one record.

use serde::{Deserialize, Serialize};

use super::PaymentStatus;
use crate::domain::catalog::SubscriptionPlan;
use crate::domain::foundation::{
    AccountId, DomainError, ErrorCode, PaymentId, PlanId, StateMachine, Timestamp,
};

/// What the gateway told us about a settled transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayMetadata {
    /// Gateway's own transaction id.
    pub transaction_id: Option<String>,
    /// Gateway reference (flwRef).
    pub payment_reference: Option<String>,
    /// Card, bank transfer, USSD ...
    pub payment_method: Option<String>,
    pub transaction_date: Option<Timestamp>,
}

/// A payment attempt for one plan by one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub account_id: AccountId,
    pub plan_id: PlanId,
    /// Copied from the plan when the attempt starts; later repricing does not touch it.
    pub amount: i64,
    pub status: PaymentStatus,
    pub gateway: GatewayMetadata,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PaymentRecord {
    /// Starts a pending payment for `plan`.
    pub fn initiate(id: PaymentId, account_id: AccountId, plan: &SubscriptionPlan, now: Timestamp) -> Self {
        Self {
            id,
            account_id,
            plan_id: plan.id,
            amount: plan.price,
            status: PaymentStatus::Pending,
            gateway: GatewayMetadata::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }

    /// Settles the payment as successful and records gateway metadata.
    ///
    /// # Errors
    ///
    /// `InvalidStateTransition` unless the payment is pending.
    pub fn mark_success(&mut self, metadata: GatewayMetadata, now: Timestamp) -> Result<(), DomainError> {
        self.transition(PaymentStatus::Success, now)?;
        self.gateway = metadata;
        Ok(())
    }

    /// Settles the payment as failed.
    ///
    /// # Errors
    ///
    /// `InvalidStateTransition` unless the payment is pending.
    pub fn mark_failed(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition(PaymentStatus::Failed, now)
    }

    fn transition(&mut self, target: PaymentStatus, now: Timestamp) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|e| {
            DomainError::new(ErrorCode::InvalidStateTransition, e.to_string())
                .with_detail("payment_id", self.id.to_string())
        })?;
        self.updated_at = now;
        Ok(())
    }
}
