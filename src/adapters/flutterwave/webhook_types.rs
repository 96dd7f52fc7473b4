//! Flutterwave wire types.
//!
//! Covers the hosted-checkout request/response and the webhook body. Two
//! webhook shapes are accepted: the v3 envelope (`{"event": .., "data": {..}}`)
//! and the older flat body (`txRef`, `flwRef`, `createdAt` at the top level).

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::foundation::Timestamp;
use crate::ports::{CallbackEvent, GatewayError};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "verif-hash";

// ════════════════════════════════════════════════════════════════════════════════
// Hosted checkout
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /v3/payments`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentBody {
    pub tx_ref: String,
    /// Major currency units, as the API expects.
    pub amount: f64,
    pub currency: String,
    pub redirect_url: String,
    pub customer: CustomerBody,
    pub customizations: CustomizationsBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerBody {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonenumber: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomizationsBody {
    pub title: String,
    pub description: String,
}

/// Response of `POST /v3/payments`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<PaymentLinkData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentLinkData {
    pub link: String,
}

/// Converts minor units (kobo) to the decimal amount sent to the API.
pub fn to_major_units(minor: i64) -> f64 {
    minor as f64 / 100.0
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook body
// ════════════════════════════════════════════════════════════════════════════════

/// Charge fields present in both webhook shapes.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeData {
    #[serde(alias = "txRef")]
    pub tx_ref: String,
    pub status: String,
    #[serde(default, alias = "flwRef")]
    pub flw_ref: Option<String>,
    #[serde(default, alias = "paymentType")]
    pub payment_type: Option<String>,
    /// Numeric in v3, sometimes a string in older payloads.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WebhookBody {
    Envelope {
        #[serde(default)]
        event: Option<String>,
        data: ChargeData,
    },
    Flat(ChargeData),
}

impl WebhookBody {
    pub fn charge(self) -> ChargeData {
        match self {
            WebhookBody::Envelope { data, .. } => data,
            WebhookBody::Flat(data) => data,
        }
    }
}

impl From<ChargeData> for CallbackEvent {
    fn from(charge: ChargeData) -> Self {
        let transaction_id = charge.id.and_then(|id| match id {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        let occurred_at = charge
            .created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| Timestamp::from_datetime(dt.with_timezone(&Utc)));

        CallbackEvent {
            tx_ref: charge.tx_ref,
            status: charge.status,
            gateway_reference: charge.flw_ref,
            payment_method: charge.payment_type,
            transaction_id,
            occurred_at,
        }
    }
}

/// Parses a webhook body of either shape into a callback event.
pub fn parse_webhook(payload: &[u8]) -> Result<CallbackEvent, GatewayError> {
    let body: WebhookBody = serde_json::from_slice(payload).map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse webhook payload");
        GatewayError::invalid_webhook(format!("Invalid webhook body: {}", e))
    })?;
    let charge = body.charge();
    if charge.tx_ref.trim().is_empty() {
        return Err(GatewayError::invalid_webhook("Webhook body has an empty tx_ref"));
    }
    Ok(charge.into())
}

// ════════════════════════════════════════════════════════════════════════════════
// Signature
// ════════════════════════════════════════════════════════════════════════════════

/// Hex-encoded HMAC-SHA256 of `payload` under `secret`.
pub fn sign(secret: &[u8], payload: &[u8]) -> Result<String, GatewayError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| GatewayError::provider(format!("Unusable webhook secret: {}", e)))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison of two hex signatures (case-insensitive).
pub fn signatures_match(expected_hex: &str, provided_hex: &str) -> bool {
    let provided = provided_hex.trim().to_ascii_lowercase();
    expected_hex.as_bytes().ct_eq(provided.as_bytes()).into()
}
