//! Payment gateway port for hosted checkout.
//!
//! The gateway hands out a checkout link for a transaction reference and
//! later calls back (at least once) with the outcome. Implementations own
//! the provider wire format and webhook signature scheme.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PaymentId, Timestamp};
use crate::domain::membership::MembershipError;
use crate::domain::payment::GatewayMetadata;

/// Status string the gateway sends for a completed charge.
pub const SUCCESS_STATUS: &str = "successful";

/// Port for payment gateway integrations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout link for one payment.
    async fn create_payment_link(&self, request: PaymentLinkRequest) -> Result<PaymentLink, GatewayError>;

    /// Verify a webhook signature and parse the callback body.
    ///
    /// `signature` is the raw signature header, if the request carried one.
    fn parse_callback(&self, payload: &[u8], signature: Option<&str>) -> Result<CallbackEvent, GatewayError>;
}

/// Customer details pre-filled on the checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub email: String,
    pub phone_number: Option<String>,
    pub name: String,
}

/// Request for a checkout link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLinkRequest {
    /// Echoed back on the callback.
    pub tx_ref: PaymentId,
    /// Minor currency units.
    pub amount: i64,
    pub customer: CustomerDetails,
    /// Shown on the checkout page, usually the plan name.
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub url: String,
}

/// A parsed, verified gateway callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackEvent {
    /// Our transaction reference, i.e. the payment id as a string.
    pub tx_ref: String,
    pub status: String,
    pub gateway_reference: Option<String>,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub occurred_at: Option<Timestamp>,
}

impl CallbackEvent {
    pub fn is_successful(&self) -> bool {
        self.status == SUCCESS_STATUS
    }

    /// Resolves the transaction reference to a payment id.
    pub fn payment_id(&self) -> Option<PaymentId> {
        self.tx_ref.trim().parse().ok()
    }

    pub fn metadata(&self) -> GatewayMetadata {
        GatewayMetadata {
            transaction_id: self.transaction_id.clone(),
            payment_reference: self.gateway_reference.clone(),
            payment_method: self.payment_method.clone(),
            transaction_date: self.occurred_at,
        }
    }
}

/// Errors from gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::AuthenticationError, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::ProviderError, message)
    }

    pub fn invalid_webhook(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidWebhook, message)
    }

    pub fn invalid_signature() -> Self {
        Self::new(GatewayErrorCode::InvalidSignature, "Webhook signature mismatch")
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for MembershipError {
    fn from(err: GatewayError) -> Self {
        match err.code {
            GatewayErrorCode::InvalidSignature => MembershipError::invalid_webhook_signature(),
            GatewayErrorCode::InvalidWebhook => MembershipError::validation("payload", err.message),
            _ => MembershipError::gateway(err.to_string(), err.retryable),
        }
    }
}

/// Gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    NetworkError,
    AuthenticationError,
    RateLimitExceeded,
    /// Provider answered but refused or returned an unexpected body.
    ProviderError,
    /// Callback body could not be parsed.
    InvalidWebhook,
    /// Callback signature missing or wrong.
    InvalidSignature,
}

impl GatewayErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError | GatewayErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::AuthenticationError => "authentication_error",
            GatewayErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            GatewayErrorCode::ProviderError => "provider_error",
            GatewayErrorCode::InvalidWebhook => "invalid_webhook",
            GatewayErrorCode::InvalidSignature => "invalid_signature",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PaymentGateway) {}
    }

    fn event(status: &str, tx_ref: &str) -> CallbackEvent {
        CallbackEvent {
            tx_ref: tx_ref.to_string(),
            status: status.to_string(),
            gateway_reference: Some("FLW-1".to_string()),
            payment_method: Some("card".to_string()),
            transaction_id: Some("991".to_string()),
            occurred_at: None,
        }
    }

    #[test]
    fn only_exact_sentinel_counts_as_success() {
        assert!(event("successful", "x").is_successful());
        assert!(!event("Successful", "x").is_successful());
        assert!(!event("failed", "x").is_successful());
    }

    #[test]
    fn tx_ref_resolves_to_payment_id() {
        let id = PaymentId::new();
        assert_eq!(event("successful", &id.to_string()).payment_id(), Some(id));
        assert_eq!(event("successful", "legacy-ref-12").payment_id(), None);
    }

    #[test]
    fn metadata_carries_gateway_fields() {
        let meta = event("successful", "x").metadata();
        assert_eq!(meta.payment_reference.as_deref(), Some("FLW-1"));
        assert_eq!(meta.transaction_id.as_deref(), Some("991"));
    }

    #[test]
    fn signature_error_maps_to_invalid_webhook_signature() {
        let err: MembershipError = GatewayError::invalid_signature().into();
        assert_eq!(err, MembershipError::InvalidWebhookSignature);
    }

    #[test]
    fn network_error_is_retryable_gateway_error() {
        let err: MembershipError = GatewayError::network("connection reset").into();
        assert!(matches!(err, MembershipError::GatewayError { retryable: true, .. }));
    }
}
