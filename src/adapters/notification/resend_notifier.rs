//! Email notifications through the Resend HTTP API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::ports::{NotificationKind, NotificationTarget, Notifier, NotifyError};

use super::templates::render_html;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: String,
}

/// Sends notifications as email via Resend.
pub struct ResendNotifier {
    api_key: SecretString,
    from_header: String,
    operator_email: Option<String>,
    api_url: String,
    http_client: reqwest::Client,
}

impl ResendNotifier {
    pub fn new(api_key: SecretString, from_header: impl Into<String>, operator_email: Option<String>) -> Self {
        Self {
            api_key,
            from_header: from_header.into(),
            operator_email,
            api_url: RESEND_API_URL.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Set a custom API URL (for testing).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    fn recipient<'a>(&'a self, target: &'a NotificationTarget) -> Option<(&'a str, &'a str)> {
        match target {
            NotificationTarget::Member { email, name, .. } => Some((email.as_str(), name.as_str())),
            NotificationTarget::Operator => self.operator_email.as_deref().map(|e| (e, "operator")),
        }
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn notify(
        &self,
        target: &NotificationTarget,
        kind: NotificationKind,
        data: serde_json::Value,
    ) -> Result<(), NotifyError> {
        let Some((to, name)) = self.recipient(target) else {
            tracing::warn!(kind = %kind, data = %data, "No operator email configured; alert logged only");
            return Ok(());
        };

        let body = SendEmailBody {
            from: &self.from_header,
            to: vec![to],
            subject: kind.subject(),
            html: render_html(kind, name, &data),
        };

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::new(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(NotifyError::new(format!("Resend API error ({}): {}", status, text)));
        }

        tracing::info!(kind = %kind, "Notification email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::AccountId;

    fn notifier(operator: Option<&str>) -> ResendNotifier {
        ResendNotifier::new(
            SecretString::new("re_test".to_string()),
            "Gym <noreply@gym.example>",
            operator.map(str::to_string),
        )
        .with_api_url("http://127.0.0.1:9/emails")
    }

    #[test]
    fn member_target_resolves_to_their_address() {
        let n = notifier(None);
        let target = NotificationTarget::Member {
            account_id: AccountId::new(),
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
        };
        assert_eq!(n.recipient(&target), Some(("ada@example.com", "Ada")));
    }

    #[tokio::test]
    async fn operator_alert_without_mailbox_is_dropped_quietly() {
        let result = notifier(None)
            .notify(&NotificationTarget::Operator, NotificationKind::OperatorAlert, serde_json::json!({}))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_error() {
        let result = notifier(Some("ops@gym.example"))
            .notify(&NotificationTarget::Operator, NotificationKind::OperatorAlert, serde_json::json!({}))
            .await;
        assert!(result.is_err());
    }
}
