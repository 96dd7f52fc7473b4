//! Notification adapters.
//!
//! - `resend_notifier` - Email via the Resend API
//! - `log_notifier` - Tracing-only notifier and an in-memory recorder

mod log_notifier;
mod resend_notifier;
mod templates;

pub use log_notifier::{LogNotifier, RecordingNotifier, SentNotification};
pub use resend_notifier::ResendNotifier;
