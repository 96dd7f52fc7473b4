//! Flutterwave payment gateway adapter.
//!
//! Implements `PaymentGateway` against the Flutterwave v3 hosted checkout API.
//!
//! # Security
//!
//! - Webhooks carry an HMAC-SHA256 of the raw body in the `verif-hash` header
//! - Signatures are compared in constant time
//! - Keys are held as `secrecy::SecretString`
//!
//! An empty webhook secret turns verification off. Configuration validation
//! refuses that outside development.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::ports::{
    CallbackEvent, GatewayError, GatewayErrorCode, PaymentGateway, PaymentLink, PaymentLinkRequest,
};

use super::webhook_types::{
    parse_webhook, sign, signatures_match, to_major_units, CreatePaymentBody, CreatePaymentResponse,
    CustomerBody, CustomizationsBody,
};

/// Flutterwave API configuration.
#[derive(Clone)]
pub struct FlutterwaveConfig {
    secret_key: SecretString,
    webhook_secret: SecretString,
    api_base_url: String,
    currency: String,
    redirect_url: String,
    checkout_title: String,
}

impl FlutterwaveConfig {
    pub fn new(secret_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            secret_key: SecretString::new(secret_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: "https://api.flutterwave.com".to_string(),
            currency: "NGN".to_string(),
            redirect_url: "http://localhost:3000/payment/complete".to_string(),
            checkout_title: "Gym Subscription".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = url.into();
        self
    }

    pub fn with_checkout_title(mut self, title: impl Into<String>) -> Self {
        self.checkout_title = title.into();
        self
    }

    fn verifies_webhooks(&self) -> bool {
        !self.webhook_secret.expose_secret().is_empty()
    }
}

/// Flutterwave payment gateway adapter.
pub struct FlutterwaveGateway {
    config: FlutterwaveConfig,
    http_client: reqwest::Client,
}

impl FlutterwaveGateway {
    pub fn new(config: FlutterwaveConfig) -> Self {
        if !config.verifies_webhooks() {
            tracing::warn!("Flutterwave webhook secret is empty; callbacks will not be verified");
        }
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn payment_body(&self, request: &PaymentLinkRequest) -> CreatePaymentBody {
        CreatePaymentBody {
            tx_ref: request.tx_ref.to_string(),
            amount: to_major_units(request.amount),
            currency: self.config.currency.clone(),
            redirect_url: self.config.redirect_url.clone(),
            customer: CustomerBody {
                email: request.customer.email.clone(),
                phonenumber: request.customer.phone_number.clone(),
                name: request.customer.name.clone(),
            },
            customizations: CustomizationsBody {
                title: self.config.checkout_title.clone(),
                description: format!("Payment for {}", request.description),
            },
        }
    }

    fn verify_signature(&self, payload: &[u8], signature: Option<&str>) -> Result<(), GatewayError> {
        if !self.config.verifies_webhooks() {
            return Ok(());
        }
        let provided = signature.ok_or_else(|| {
            tracing::warn!("Webhook received without signature header");
            GatewayError::invalid_signature()
        })?;
        let expected = sign(self.config.webhook_secret.expose_secret().as_bytes(), payload)?;
        if !signatures_match(&expected, provided) {
            tracing::warn!(payload_len = payload.len(), "Invalid webhook signature");
            return Err(GatewayError::invalid_signature());
        }
        Ok(())
    }
}

fn error_for_status(status: reqwest::StatusCode, body: String) -> GatewayError {
    let code = match status.as_u16() {
        401 | 403 => GatewayErrorCode::AuthenticationError,
        429 => GatewayErrorCode::RateLimitExceeded,
        500..=599 => GatewayErrorCode::NetworkError,
        _ => GatewayErrorCode::ProviderError,
    };
    GatewayError::new(code, format!("Flutterwave API error ({}): {}", status, body))
}

#[async_trait]
impl PaymentGateway for FlutterwaveGateway {
    async fn create_payment_link(&self, request: PaymentLinkRequest) -> Result<PaymentLink, GatewayError> {
        let url = format!("{}/v3/payments", self.config.api_base_url);
        let body = self.payment_body(&request);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.config.secret_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(tx_ref = %request.tx_ref, status = %status, "Checkout link request rejected");
            return Err(error_for_status(status, error_text));
        }

        let parsed: CreatePaymentResponse = response.json().await.map_err(|e| {
            GatewayError::provider(format!("Failed to parse Flutterwave response: {}", e))
        })?;

        match parsed.data {
            Some(data) if parsed.status == "success" => {
                tracing::debug!(tx_ref = %request.tx_ref, "Checkout link created");
                Ok(PaymentLink { url: data.link })
            }
            _ => Err(GatewayError::provider(format!(
                "Flutterwave returned no checkout link: {}",
                parsed.message.unwrap_or(parsed.status)
            ))),
        }
    }

    fn parse_callback(&self, payload: &[u8], signature: Option<&str>) -> Result<CallbackEvent, GatewayError> {
        self.verify_signature(payload, signature)?;
        parse_webhook(payload)
    }
}
