//! Payment configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration (Flutterwave)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Flutterwave secret key. Empty selects the mock gateway (development only).
    #[serde(default = "empty_secret")]
    pub secret_key: SecretString,

    /// Secret hash compared against the `verif-hash` webhook header
    #[serde(default = "empty_secret")]
    pub webhook_secret: SecretString,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Where the checkout page sends the member afterwards
    pub redirect_url: Option<String>,
}

impl PaymentConfig {
    pub fn is_configured(&self) -> bool {
        !self.secret_key.expose_secret().is_empty()
    }

    pub fn verifies_webhooks(&self) -> bool {
        !self.webhook_secret.expose_secret().is_empty()
    }

    /// Check if using a Flutterwave test key
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.expose_secret().contains("_TEST")
    }

    /// Validate payment configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if !self.is_configured() {
            if production {
                return Err(ValidationError::MissingRequired("PAYMENT__SECRET_KEY"));
            }
        } else if !self.secret_key.expose_secret().starts_with("FLWSECK") {
            return Err(ValidationError::InvalidGatewayKey);
        }
        if production && !self.verifies_webhooks() {
            return Err(ValidationError::WebhookSecretRequired);
        }
        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(ValidationError::InvalidGatewayUrl);
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidCurrency);
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            secret_key: empty_secret(),
            webhook_secret: empty_secret(),
            base_url: default_base_url(),
            currency: default_currency(),
            redirect_url: None,
        }
    }
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_base_url() -> String {
    "https://api.flutterwave.com".to_string()
}

fn default_currency() -> String {
    "NGN".to_string()
}
