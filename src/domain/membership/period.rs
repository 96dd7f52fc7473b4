//! Membership periods embedded in an account.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{PaymentId, PlanId, Timestamp};

/// Status of a membership period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    Active,
    /// Lapsed; set by the expiry sweep.
    Inactive,
    /// Present in stored documents; nothing in this service writes it.
    Expired,
}

impl PeriodStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodStatus::Active => "active",
            PeriodStatus::Inactive => "inactive",
            PeriodStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time-bounded grant of access to one plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipPeriod {
    pub plan_id: PlanId,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub status: PeriodStatus,
    /// Payment whose callback wrote this period. Older documents lack it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granted_by: Option<PaymentId>,
}

impl MembershipPeriod {
    pub fn active(plan_id: PlanId, start_date: Timestamp, end_date: Timestamp) -> Self {
        Self {
            plan_id,
            start_date,
            end_date,
            status: PeriodStatus::Active,
            granted_by: None,
        }
    }

    pub fn paid_by(mut self, payment_id: PaymentId) -> Self {
        self.granted_by = Some(payment_id);
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == PeriodStatus::Active
    }

    /// Active and not yet past its end date.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.is_active() && !self.end_date.is_before(&now)
    }

    /// Active but already past its end date.
    pub fn has_lapsed(&self, now: Timestamp) -> bool {
        self.is_active() && self.end_date.is_before(&now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lapsed_only_when_end_is_strictly_before_now() {
        let now = Timestamp::now();
        let ending_now = MembershipPeriod::active(PlanId::new(), now.add_days(-30), now);
        assert!(!ending_now.has_lapsed(now));
        assert!(ending_now.is_active_at(now));

        let ended = MembershipPeriod::active(PlanId::new(), now.add_days(-30), now.add_days(-1));
        assert!(ended.has_lapsed(now));
        assert!(!ended.is_active_at(now));
    }

    #[test]
    fn inactive_period_never_lapses_again() {
        let now = Timestamp::now();
        let mut period = MembershipPeriod::active(PlanId::new(), now.add_days(-30), now.add_days(-1));
        period.status = PeriodStatus::Inactive;
        assert!(!period.has_lapsed(now));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PeriodStatus::Inactive).unwrap(), "\"inactive\"");
    }

    #[test]
    fn documents_without_granting_payment_still_load() {
        let json = r#"{"plan_id":"6a1f0c3e-6f0b-4c1e-9a57-0d8f6c2b1e11","start_date":"2024-01-01T00:00:00Z","end_date":"2024-02-01T00:00:00Z","status":"active"}"#;
        let period: MembershipPeriod = serde_json::from_str(json).unwrap();
        assert_eq!(period.granted_by, None);
        assert!(period.is_active());
    }
}
