//! Notification port.
//!
//! Notifications are side effects. Workflows call them through
//! [`notify_quietly`], so a failed send is logged and never reaches the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::AccountId;
use crate::domain::membership::Account;

/// Which message template to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A member's period lapsed during the expiry sweep.
    SubscriptionExpired,
    /// Something needs a human: payment and membership disagree.
    OperatorAlert,
}

impl NotificationKind {
    pub fn subject(&self) -> &'static str {
        match self {
            NotificationKind::SubscriptionExpired => "Subscription Expired",
            NotificationKind::OperatorAlert => "Payment reconciliation alert",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationKind::SubscriptionExpired => "subscription_expired",
            NotificationKind::OperatorAlert => "operator_alert",
        };
        f.write_str(s)
    }
}

/// Who receives a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationTarget {
    Member {
        account_id: AccountId,
        email: String,
        name: String,
    },
    /// The configured operator mailbox.
    Operator,
}

impl NotificationTarget {
    pub fn member(account: &Account) -> Self {
        NotificationTarget::Member {
            account_id: account.id,
            email: account.email.clone(),
            name: account.full_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyError {
    pub message: String,
}

impl NotifyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "notification failed: {}", self.message)
    }
}

impl std::error::Error for NotifyError {}

/// Port for outbound notifications (email, chat, ...).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        target: &NotificationTarget,
        kind: NotificationKind,
        data: serde_json::Value,
    ) -> Result<(), NotifyError>;
}

/// Sends a notification, logging instead of propagating failures.
pub async fn notify_quietly(
    notifier: &dyn Notifier,
    target: &NotificationTarget,
    kind: NotificationKind,
    data: serde_json::Value,
) {
    if let Err(error) = notifier.notify(target, kind, data).await {
        tracing::warn!(kind = %kind, error = %error, "Notification failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(
            &self,
            _target: &NotificationTarget,
            _kind: NotificationKind,
            _data: serde_json::Value,
        ) -> Result<(), NotifyError> {
            Err(NotifyError::new("smtp down"))
        }
    }

    #[tokio::test]
    async fn notify_quietly_swallows_failures() {
        notify_quietly(
            &FailingNotifier,
            &NotificationTarget::Operator,
            NotificationKind::OperatorAlert,
            serde_json::json!({}),
        )
        .await;
    }

    #[test]
    fn expired_subject_matches_template() {
        assert_eq!(NotificationKind::SubscriptionExpired.subject(), "Subscription Expired");
    }
}
