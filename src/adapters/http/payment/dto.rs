//! HTTP DTOs for payment endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::membership::{HandlePaymentCallbackResult, InitiatePaymentResult};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start paying for a plan.
#[derive(Debug, Clone, Deserialize)]
pub struct InitiatePaymentRequest {
    pub account_id: String,
    /// Plan to subscribe to.
    pub plan_id: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentResponse {
    pub payment_id: String,
    /// Hosted checkout page for the member.
    pub payment_link: String,
}

impl From<InitiatePaymentResult> for InitiatePaymentResponse {
    fn from(result: InitiatePaymentResult) -> Self {
        Self {
            payment_id: result.payment_id.to_string(),
            payment_link: result.payment_link,
        }
    }
}

/// Acknowledgement returned to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub message: String,
}

impl From<&HandlePaymentCallbackResult> for WebhookResponse {
    fn from(result: &HandlePaymentCallbackResult) -> Self {
        let message = match result {
            HandlePaymentCallbackResult::MembershipActivated { .. } => "Webhook handled successfully",
            HandlePaymentCallbackResult::AlreadyProcessed { .. } => "Payment already processed successfully",
        };
        Self {
            message: message.to_string(),
        }
    }
}
