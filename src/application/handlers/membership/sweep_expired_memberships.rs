//! SweepExpiredMembershipsHandler - Periodic expiry of lapsed memberships.
//!
//! Every account holding an active period is re-read and its lapsed periods
//! are marked inactive. Pending payments nobody called back about are failed
//! once they pass the TTL. Failures for one account never stop the sweep.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::domain::foundation::{AccountId, PlanId, Timestamp};
use crate::domain::membership::{Account, MembershipError};
use crate::ports::{
    notify_quietly, AccountRepository, NotificationKind, NotificationTarget, Notifier, PaymentRepository,
    PlanRepository, SettleOutcome,
};

/// Default age after which an unanswered pending payment is failed.
pub const DEFAULT_PENDING_PAYMENT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Counters from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub accounts_scanned: usize,
    pub periods_expired: usize,
    pub accounts_failed: usize,
    pub stale_payments_failed: usize,
}

impl SweepReport {
    pub fn changed_anything(&self) -> bool {
        self.periods_expired > 0 || self.stale_payments_failed > 0
    }
}

/// Handler for the expiry sweep.
pub struct SweepExpiredMembershipsHandler {
    accounts: Arc<dyn AccountRepository>,
    plans: Arc<dyn PlanRepository>,
    payments: Arc<dyn PaymentRepository>,
    notifier: Arc<dyn Notifier>,
    pending_payment_ttl: Duration,
}

impl SweepExpiredMembershipsHandler {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        plans: Arc<dyn PlanRepository>,
        payments: Arc<dyn PaymentRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            accounts,
            plans,
            payments,
            notifier,
            pending_payment_ttl: DEFAULT_PENDING_PAYMENT_TTL,
        }
    }

    pub fn with_pending_payment_ttl(mut self, ttl: Duration) -> Self {
        self.pending_payment_ttl = ttl;
        self
    }

    /// Runs one sweep as of `now`.
    ///
    /// # Errors
    ///
    /// Only when the candidate lists cannot be read at all.
    pub async fn sweep(&self, now: Timestamp) -> Result<SweepReport, MembershipError> {
        let mut report = SweepReport::default();

        let candidates = self.accounts.find_ids_with_active_periods().await?;
        for account_id in candidates {
            report.accounts_scanned += 1;
            match self.expire_account(account_id, now).await {
                Ok(expired) => report.periods_expired += expired,
                Err(err) => {
                    report.accounts_failed += 1;
                    tracing::warn!(account_id = %account_id, error = %err, "Expiry failed for account; retried next sweep");
                }
            }
        }

        report.stale_payments_failed = self.fail_stale_payments(now).await?;

        tracing::info!(
            accounts_scanned = report.accounts_scanned,
            periods_expired = report.periods_expired,
            accounts_failed = report.accounts_failed,
            stale_payments_failed = report.stale_payments_failed,
            "Expiry sweep finished"
        );
        Ok(report)
    }

    async fn expire_account(&self, account_id: AccountId, now: Timestamp) -> Result<usize, MembershipError> {
        // Fresh read: a callback may have renewed the period since the scan
        let Some(mut account) = self.accounts.find_by_id(&account_id).await? else {
            return Ok(0);
        };

        let expired = account.expire_periods(now);
        if expired.is_empty() {
            return Ok(0);
        }

        self.accounts.update(&account).await?;
        tracing::info!(account_id = %account_id, periods = expired.len(), "Membership periods expired");

        self.notify_expired(&account, &expired).await;
        Ok(expired.len())
    }

    async fn notify_expired(&self, account: &Account, expired: &[PlanId]) {
        let mut plan_names = Vec::with_capacity(expired.len());
        for plan_id in expired {
            match self.plans.find_by_id(plan_id).await {
                Ok(Some(plan)) => plan_names.push(plan.name),
                Ok(None) => {}
                Err(err) => tracing::debug!(plan_id = %plan_id, error = %err, "Plan lookup failed for notification"),
            }
        }

        notify_quietly(
            self.notifier.as_ref(),
            &NotificationTarget::member(account),
            NotificationKind::SubscriptionExpired,
            json!({
                "plan_ids": expired,
                "plan_names": plan_names,
            }),
        )
        .await;
    }

    async fn fail_stale_payments(&self, now: Timestamp) -> Result<usize, MembershipError> {
        let cutoff = now.minus_secs(self.pending_payment_ttl.as_secs());
        let stale = self.payments.find_pending_created_before(cutoff).await?;

        let mut failed = 0;
        for record in stale {
            match self.payments.settle_failed(&record.id, now).await {
                Ok(SettleOutcome::Applied) => {
                    failed += 1;
                    tracing::info!(payment_id = %record.id, "Stale pending payment failed");
                }
                // A callback settled it in the meantime
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(payment_id = %record.id, error = %err, "Could not fail stale payment");
                }
            }
        }
        Ok(failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryAccountRepository, InMemoryPaymentRepository, InMemoryPlanRepository};
    use crate::adapters::notification::RecordingNotifier;
    use crate::domain::catalog::{PlanDuration, RenewalType, SubscriptionPlan};
    use crate::domain::foundation::{DomainError, ErrorCode, PaymentId};
    use crate::domain::membership::PeriodStatus;
    use crate::domain::payment::{PaymentRecord, PaymentStatus};
    use async_trait::async_trait;

    // ════════════════════════════════════════════════════════════════════════════
    // Fixture
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        accounts: InMemoryAccountRepository,
        plans: InMemoryPlanRepository,
        payments: InMemoryPaymentRepository,
        notifier: RecordingNotifier,
        plan: SubscriptionPlan,
    }

    impl Fixture {
        async fn new() -> Self {
            let plans = InMemoryPlanRepository::new();
            let plan =
                SubscriptionPlan::new(PlanId::new(), "Daily", PlanDuration::OneDay, 2_000, RenewalType::Manual).unwrap();
            plans.save(&plan).await.unwrap();
            Self {
                accounts: InMemoryAccountRepository::new(),
                plans,
                payments: InMemoryPaymentRepository::new(),
                notifier: RecordingNotifier::new(),
                plan,
            }
        }

        fn handler(&self) -> SweepExpiredMembershipsHandler {
            SweepExpiredMembershipsHandler::new(
                Arc::new(self.accounts.clone()),
                Arc::new(self.plans.clone()),
                Arc::new(self.payments.clone()),
                Arc::new(self.notifier.clone()),
            )
        }

        async fn member_with_period(&self, username: &str, start: Timestamp, end: Timestamp) -> Account {
            let mut account = Account::register(
                AccountId::new(),
                username,
                format!("{}@example.com", username),
                "Member",
                None,
            )
            .unwrap();
            account.grant_period(self.plan.id, start, end);
            self.accounts.insert(&account).await.unwrap();
            account
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Expiry
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn lapsed_period_becomes_inactive_and_member_is_told() {
        let fx = Fixture::new().await;
        let now = Timestamp::now();
        let lapsed = fx.member_with_period("ada", now.add_days(-2), now.add_days(-1)).await;
        let current = fx.member_with_period("tunde", now, now.add_days(1)).await;

        let report = fx.handler().sweep(now).await.unwrap();

        assert_eq!(report.accounts_scanned, 2);
        assert_eq!(report.periods_expired, 1);
        assert_eq!(report.accounts_failed, 0);

        let stored = fx.accounts.get(&lapsed.id).await.unwrap();
        assert_eq!(stored.period_for(fx.plan.id).unwrap().status, PeriodStatus::Inactive);
        assert!(fx.accounts.get(&current.id).await.unwrap().has_active_period_for(fx.plan.id));

        let sent = fx.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::SubscriptionExpired);
        assert_eq!(sent[0].target, NotificationTarget::member(&lapsed));
        assert_eq!(sent[0].data["plan_names"], json!(["Daily"]));
    }

    #[tokio::test]
    async fn second_sweep_is_a_no_op() {
        let fx = Fixture::new().await;
        let now = Timestamp::now();
        fx.member_with_period("ada", now.add_days(-2), now.add_days(-1)).await;
        let handler = fx.handler();

        handler.sweep(now).await.unwrap();
        let second = handler.sweep(now).await.unwrap();

        assert_eq!(second.periods_expired, 0);
        assert!(!second.changed_anything());
        assert_eq!(fx.notifier.count(NotificationKind::SubscriptionExpired), 1);
    }

    #[tokio::test]
    async fn period_ending_exactly_now_is_kept() {
        let fx = Fixture::new().await;
        let now = Timestamp::now();
        let account = fx.member_with_period("ada", now.add_days(-1), now).await;

        let report = fx.handler().sweep(now).await.unwrap();

        assert_eq!(report.periods_expired, 0);
        assert!(fx.accounts.get(&account.id).await.unwrap().has_active_period());
    }

    #[tokio::test]
    async fn notification_failure_does_not_undo_expiry() {
        let fx = Fixture::new().await;
        let now = Timestamp::now();
        let account = fx.member_with_period("ada", now.add_days(-2), now.add_days(-1)).await;
        let handler = SweepExpiredMembershipsHandler::new(
            Arc::new(fx.accounts.clone()),
            Arc::new(fx.plans.clone()),
            Arc::new(fx.payments.clone()),
            Arc::new(RecordingNotifier::failing()),
        );

        let report = handler.sweep(now).await.unwrap();

        assert_eq!(report.periods_expired, 1);
        assert!(!fx.accounts.get(&account.id).await.unwrap().has_active_period());
    }

    /// Fails every write for one account.
    struct OneBrokenAccount {
        inner: InMemoryAccountRepository,
        broken: AccountId,
    }

    #[async_trait]
    impl AccountRepository for OneBrokenAccount {
        async fn insert(&self, account: &Account) -> Result<(), DomainError> {
            self.inner.insert(account).await
        }

        async fn update(&self, account: &Account) -> Result<(), DomainError> {
            if account.id == self.broken {
                return Err(DomainError::new(ErrorCode::ConcurrentModification, "stale"));
            }
            self.inner.update(account).await
        }

        async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
            self.inner.find_by_id(id).await
        }

        async fn find_ids_with_active_periods(&self) -> Result<Vec<AccountId>, DomainError> {
            self.inner.find_ids_with_active_periods().await
        }

        async fn find_by_plan(&self, plan_id: &PlanId) -> Result<Vec<Account>, DomainError> {
            self.inner.find_by_plan(plan_id).await
        }

        async fn find_clocked_in_between(
            &self,
            from: Timestamp,
            to: Timestamp,
        ) -> Result<Vec<Account>, DomainError> {
            self.inner.find_clocked_in_between(from, to).await
        }
    }

    #[tokio::test]
    async fn failing_account_is_counted_and_sweep_continues() {
        let fx = Fixture::new().await;
        let now = Timestamp::now();
        let broken = fx.member_with_period("ada", now.add_days(-2), now.add_days(-1)).await;
        let healthy = fx.member_with_period("tunde", now.add_days(-2), now.add_days(-1)).await;
        let handler = SweepExpiredMembershipsHandler::new(
            Arc::new(OneBrokenAccount {
                inner: fx.accounts.clone(),
                broken: broken.id,
            }),
            Arc::new(fx.plans.clone()),
            Arc::new(fx.payments.clone()),
            Arc::new(fx.notifier.clone()),
        );

        let report = handler.sweep(now).await.unwrap();

        assert_eq!(report.accounts_failed, 1);
        assert_eq!(report.periods_expired, 1);
        assert!(fx.accounts.get(&broken.id).await.unwrap().has_active_period());
        assert!(!fx.accounts.get(&healthy.id).await.unwrap().has_active_period());
        // Nobody is told about an expiry that was not persisted
        assert_eq!(fx.notifier.count(NotificationKind::SubscriptionExpired), 1);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Stale payments
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn stale_pending_payment_is_failed() {
        let fx = Fixture::new().await;
        let now = Timestamp::now();
        let old = PaymentRecord::initiate(PaymentId::new(), AccountId::new(), &fx.plan, now.add_days(-2));
        let fresh = PaymentRecord::initiate(PaymentId::new(), AccountId::new(), &fx.plan, now);
        fx.payments.insert(&old).await.unwrap();
        fx.payments.insert(&fresh).await.unwrap();

        let report = fx.handler().sweep(now).await.unwrap();

        assert_eq!(report.stale_payments_failed, 1);
        assert_eq!(fx.payments.get(&old.id).await.unwrap().status, PaymentStatus::Failed);
        assert_eq!(fx.payments.get(&fresh.id).await.unwrap().status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn ttl_is_configurable() {
        let fx = Fixture::new().await;
        let now = Timestamp::now();
        let record = PaymentRecord::initiate(PaymentId::new(), AccountId::new(), &fx.plan, now.minus_secs(120));
        fx.payments.insert(&record).await.unwrap();

        let report = fx
            .handler()
            .with_pending_payment_ttl(Duration::from_secs(60))
            .sweep(now)
            .await
            .unwrap();

        assert_eq!(report.stale_payments_failed, 1);
    }

    #[tokio::test]
    async fn oversized_ttl_fails_nothing() {
        let fx = Fixture::new().await;
        let now = Timestamp::now();
        let record = PaymentRecord::initiate(PaymentId::new(), AccountId::new(), &fx.plan, now.add_days(-30));
        fx.payments.insert(&record).await.unwrap();

        let report = fx
            .handler()
            .with_pending_payment_ttl(Duration::from_secs(100_000_000_000_000_000))
            .sweep(now)
            .await
            .unwrap();

        assert_eq!(report.stale_payments_failed, 0);
        assert_eq!(fx.payments.get(&record.id).await.unwrap().status, PaymentStatus::Pending);
    }
}
