//! Email configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Outgoing mail through Resend.
///
/// Without an API key notifications are only logged.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub resend_api_key: SecretString,
    pub from_email: String,
    pub from_name: String,
    /// Mailbox for reconciliation alerts
    pub operator_email: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: SecretString::new(String::new()),
            from_email: "noreply@gymdesk.app".to_string(),
            from_name: "Gymdesk".to_string(),
            operator_email: None,
        }
    }
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        !self.resend_api_key.expose_secret().is_empty()
    }

    /// `Name <address>` as sent in the From header.
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_configured() && !self.resend_api_key.expose_secret().starts_with("re_") {
            return Err(ValidationError::InvalidResendKey);
        }
        if !looks_like_address(&self.from_email) {
            return Err(ValidationError::InvalidEmail("from_email"));
        }
        match &self.operator_email {
            Some(operator) if !looks_like_address(operator) => {
                Err(ValidationError::InvalidEmail("operator_email"))
            }
            _ => Ok(()),
        }
    }
}

fn looks_like_address(raw: &str) -> bool {
    match raw.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}
