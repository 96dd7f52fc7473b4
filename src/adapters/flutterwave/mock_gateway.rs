//! Mock payment gateway for testing.
//!
//! Provides a configurable `PaymentGateway` for unit and integration tests:
//! - Error injection per method
//! - Call tracking
//! - Webhook verification modes
//!
//! Callback bodies are parsed with the real Flutterwave wire types, so tests
//! post the same JSON the live gateway would.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::ports::{CallbackEvent, GatewayError, PaymentGateway, PaymentLink, PaymentLinkRequest};

use super::webhook_types::{parse_webhook, sign, signatures_match};

/// Mock payment gateway.
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// gateway.set_method_error("create_payment_link", GatewayError::network("down"));
/// assert!(gateway.create_payment_link(req).await.is_err());
/// assert_eq!(gateway.call_count("create_payment_link"), 1);
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    method_errors: HashMap<String, GatewayError>,
    call_log: Vec<MethodCall>,
    link_requests: Vec<PaymentLinkRequest>,
    webhook_mode: WebhookVerifyMode,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

#[derive(Default, Clone)]
enum WebhookVerifyMode {
    #[default]
    AcceptAll,
    /// HMAC-SHA256 hex of the body under this secret.
    RequireSignature(String),
    AlwaysFail,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that verifies signatures the way the live adapter does.
    pub fn with_webhook_secret(secret: impl Into<String>) -> Self {
        let mock = Self::new();
        mock.state().webhook_mode = WebhookVerifyMode::RequireSignature(secret.into());
        mock
    }

    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.state().webhook_mode = WebhookVerifyMode::AlwaysFail;
        mock
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail every call to `method` with `error` until cleared.
    pub fn set_method_error(&self, method: &str, error: GatewayError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        self.state().method_errors.clear();
    }

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state().call_log.iter().filter(|c| c.method == method).count()
    }

    /// Checkout requests received so far.
    pub fn link_requests(&self) -> Vec<PaymentLinkRequest> {
        self.state().link_requests.clone()
    }

    /// Checkout URL the mock hands out for a transaction reference.
    pub fn link_for(tx_ref: &str) -> String {
        format!("https://checkout.mock/pay/{}", tx_ref)
    }

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), GatewayError> {
        match self.state().method_errors.get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_payment_link(&self, request: PaymentLinkRequest) -> Result<PaymentLink, GatewayError> {
        let tx_ref = request.tx_ref.to_string();
        self.record_call("create_payment_link", vec![tx_ref.clone(), request.amount.to_string()]);
        self.check_error("create_payment_link")?;
        self.state().link_requests.push(request);
        Ok(PaymentLink {
            url: Self::link_for(&tx_ref),
        })
    }

    fn parse_callback(&self, payload: &[u8], signature: Option<&str>) -> Result<CallbackEvent, GatewayError> {
        self.record_call("parse_callback", vec![signature.unwrap_or_default().to_string()]);
        self.check_error("parse_callback")?;

        let mode = self.state().webhook_mode.clone();
        match mode {
            WebhookVerifyMode::AcceptAll => {}
            WebhookVerifyMode::AlwaysFail => return Err(GatewayError::invalid_signature()),
            WebhookVerifyMode::RequireSignature(secret) => {
                let expected = sign(secret.as_bytes(), payload)?;
                if !signature.is_some_and(|s| signatures_match(&expected, s)) {
                    return Err(GatewayError::invalid_signature());
                }
            }
        }
        parse_webhook(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::PaymentId;
    use crate::ports::{CustomerDetails, GatewayErrorCode};

    fn request() -> PaymentLinkRequest {
        PaymentLinkRequest {
            tx_ref: PaymentId::new(),
            amount: 500_000,
            customer: CustomerDetails {
                email: "a@b.c".to_string(),
                phone_number: None,
                name: "A".to_string(),
            },
            description: "Weekly".to_string(),
        }
    }

    #[tokio::test]
    async fn link_embeds_reference_and_is_tracked() {
        let mock = MockPaymentGateway::new();
        let req = request();
        let link = mock.create_payment_link(req.clone()).await.unwrap();

        assert_eq!(link.url, MockPaymentGateway::link_for(&req.tx_ref.to_string()));
        assert_eq!(mock.call_count("create_payment_link"), 1);
        assert_eq!(mock.link_requests(), vec![req]);
    }

    #[tokio::test]
    async fn injected_error_is_returned_until_cleared() {
        let mock = MockPaymentGateway::new();
        mock.set_method_error("create_payment_link", GatewayError::network("down"));
        assert!(mock.create_payment_link(request()).await.is_err());

        mock.clear_errors();
        assert!(mock.create_payment_link(request()).await.is_ok());
        assert_eq!(mock.call_count("create_payment_link"), 2);
    }

    #[test]
    fn signature_mode_checks_hmac() {
        let mock = MockPaymentGateway::with_webhook_secret("s3cret");
        let body = br#"{"txRef":"r","status":"successful"}"#;
        let sig = sign(b"s3cret", body).unwrap();

        assert!(mock.parse_callback(body, Some(&sig)).is_ok());
        let err = mock.parse_callback(body, Some("deadbeef")).unwrap_err();
        assert_eq!(err.code, GatewayErrorCode::InvalidSignature);
        assert!(mock.parse_callback(body, None).is_err());
    }

    #[test]
    fn rejecting_mode_fails_everything() {
        let mock = MockPaymentGateway::rejecting_webhooks();
        assert!(mock.parse_callback(br#"{"txRef":"r","status":"successful"}"#, None).is_err());
    }
}
