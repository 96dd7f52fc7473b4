//! Notifiers that never leave the process.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ports::{NotificationKind, NotificationTarget, Notifier, NotifyError};

/// Writes notifications to the log. Used when no email provider is configured.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        target: &NotificationTarget,
        kind: NotificationKind,
        data: serde_json::Value,
    ) -> Result<(), NotifyError> {
        match kind {
            NotificationKind::OperatorAlert => {
                tracing::error!(kind = %kind, target = ?target, data = %data, "Operator alert")
            }
            NotificationKind::SubscriptionExpired => {
                tracing::info!(kind = %kind, target = ?target, data = %data, "Member notification")
            }
        }
        Ok(())
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentNotification {
    pub target: NotificationTarget,
    pub kind: NotificationKind,
    pub data: serde_json::Value,
}

/// Keeps every notification in memory; can be told to fail.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentNotification>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call records the notification and then returns an error.
    pub fn failing() -> Self {
        let notifier = Self::default();
        *lock(&notifier.failing) = true;
        notifier
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        lock(&self.sent).clone()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        lock(&self.sent).iter().filter(|n| n.kind == kind).count()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        target: &NotificationTarget,
        kind: NotificationKind,
        data: serde_json::Value,
    ) -> Result<(), NotifyError> {
        lock(&self.sent).push(SentNotification {
            target: target.clone(),
            kind,
            data,
        });
        if *lock(&self.failing) {
            return Err(NotifyError::new("recording notifier set to fail"));
        }
        Ok(())
    }
}
