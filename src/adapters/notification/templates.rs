//! Email bodies for each notification kind.

use crate::ports::NotificationKind;

/// Renders the HTML body for a notification.
pub fn render_html(kind: NotificationKind, recipient_name: &str, data: &serde_json::Value) -> String {
    match kind {
        NotificationKind::SubscriptionExpired => {
            let plans = data
                .get("plan_names")
                .and_then(|v| v.as_array())
                .map(|names| {
                    names
                        .iter()
                        .filter_map(|n| n.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "your plan".to_string());
            format!(
                "<p>Hello {},</p>\
                 <p>Your subscription to {} has expired.</p>\
                 <p>Renew your membership to keep using the gym.</p>",
                escape(recipient_name),
                escape(&plans)
            )
        }
        NotificationKind::OperatorAlert => format!(
            "<p>A payment needs attention.</p><pre>{}</pre>",
            escape(&serde_json::to_string_pretty(data).unwrap_or_default())
        ),
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
