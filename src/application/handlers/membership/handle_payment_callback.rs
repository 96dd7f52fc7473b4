//! HandlePaymentCallbackHandler - Command handler for gateway payment callbacks.
//!
//! Gateways deliver callbacks at least once, so the same event may arrive
//! several times, possibly concurrently. The handler grants membership first
//! and settles the payment last with a conditional write. A crash between
//! the two leaves the payment pending, and the redelivery redoes the
//! (idempotent) grant before settling.

use std::sync::Arc;

use serde_json::json;

use crate::domain::catalog::SubscriptionPlan;
use crate::domain::foundation::{AccountId, PaymentId, PlanId, Timestamp};
use crate::domain::membership::{Account, MembershipError, MembershipPeriod, PeriodChange};
use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::ports::{
    notify_quietly, AccountRepository, CallbackEvent, NotificationKind, NotificationTarget, Notifier,
    PaymentRepository, PlanRepository, SettleOutcome,
};

/// Attempts at writing the account before giving up on version conflicts.
const MAX_GRANT_ATTEMPTS: u32 = 3;

/// Command carrying a verified, parsed gateway callback.
#[derive(Debug, Clone)]
pub struct HandlePaymentCallbackCommand {
    pub event: CallbackEvent,
}

/// Result of callback processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlePaymentCallbackResult {
    /// Payment settled and membership period granted.
    MembershipActivated {
        payment_id: PaymentId,
        account_id: AccountId,
        plan_id: PlanId,
        start_date: Timestamp,
        end_date: Timestamp,
        change: PeriodChange,
    },
    /// The payment was already settled successfully; nothing changed.
    AlreadyProcessed { payment_id: PaymentId },
}

/// Handler reconciling gateway callbacks with the payment ledger and the
/// membership ledger.
pub struct HandlePaymentCallbackHandler {
    accounts: Arc<dyn AccountRepository>,
    plans: Arc<dyn PlanRepository>,
    payments: Arc<dyn PaymentRepository>,
    notifier: Arc<dyn Notifier>,
}

impl HandlePaymentCallbackHandler {
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
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentCallbackCommand,
    ) -> Result<HandlePaymentCallbackResult, MembershipError> {
        let event = cmd.event;

        // 1. Resolve the payment record
        let payment_id = event
            .payment_id()
            .ok_or_else(|| MembershipError::payment_not_found(event.tx_ref.clone()))?;
        let record = self
            .payments
            .find_by_id(&payment_id)
            .await?
            .ok_or_else(|| MembershipError::payment_not_found(event.tx_ref.clone()))?;

        // 2. Terminal states are never revisited
        match record.status {
            PaymentStatus::Success => {
                tracing::info!(payment_id = %payment_id, "Callback replay for settled payment");
                return Ok(HandlePaymentCallbackResult::AlreadyProcessed { payment_id });
            }
            PaymentStatus::Failed => {
                tracing::info!(payment_id = %payment_id, status = %event.status, "Callback for failed payment ignored");
                return Err(MembershipError::payment_rejected(payment_id, "payment has already failed"));
            }
            PaymentStatus::Pending => {}
        }

        // 3. Resolve account and plan; a dangling payment is failed
        let (account, plan) = match self.resolve_parties(&record).await {
            Ok(parties) => parties,
            Err(err) => {
                if matches!(err, MembershipError::NotFound { .. }) {
                    self.fail_payment(payment_id).await;
                }
                return Err(err);
            }
        };

        // 4. Non-success status fails the payment
        if !event.is_successful() {
            tracing::info!(payment_id = %payment_id, status = %event.status, "Gateway reported unsuccessful payment");
            self.fail_payment(payment_id).await;
            return Err(MembershipError::payment_rejected(
                payment_id,
                format!("gateway status '{}'", event.status),
            ));
        }

        // 5. Grant the membership period, at most once per payment
        let (change, period) = self.grant_period(account, &plan, payment_id).await.map_err(|err| {
            tracing::error!(payment_id = %payment_id, error = %err, "Membership grant failed; payment left pending");
            err
        })?;

        // 6. Settle the payment last
        let settled = self
            .payments
            .settle_success(&payment_id, &event.metadata(), Timestamp::now())
            .await;

        match settled {
            Ok(SettleOutcome::Applied) => {
                tracing::info!(
                    payment_id = %payment_id,
                    account_id = %record.account_id,
                    plan_id = %plan.id,
                    change = ?change,
                    "Payment reconciled and membership granted"
                );
                Ok(HandlePaymentCallbackResult::MembershipActivated {
                    payment_id,
                    account_id: record.account_id,
                    plan_id: plan.id,
                    start_date: period.start_date,
                    end_date: period.end_date,
                    change,
                })
            }
            Ok(SettleOutcome::AlreadySettled(current)) if current.status == PaymentStatus::Success => {
                tracing::info!(payment_id = %payment_id, "Concurrent delivery settled the payment first");
                Ok(HandlePaymentCallbackResult::AlreadyProcessed { payment_id })
            }
            Ok(SettleOutcome::AlreadySettled(current)) => {
                self.report_inconsistency(&record, format!("payment became {} during reconciliation", current.status))
                    .await
            }
            Ok(SettleOutcome::NotFound) => {
                self.report_inconsistency(&record, "payment record vanished during reconciliation")
                    .await
            }
            Err(err) => {
                self.report_inconsistency(&record, format!("settling payment failed: {}", err))
                    .await
            }
        }
    }

    async fn resolve_parties(
        &self,
        record: &PaymentRecord,
    ) -> Result<(Account, SubscriptionPlan), MembershipError> {
        let account = self
            .accounts
            .find_by_id(&record.account_id)
            .await?
            .ok_or_else(|| MembershipError::account_not_found(record.account_id))?;
        let plan = self
            .plans
            .find_by_id(&record.plan_id)
            .await?
            .ok_or_else(|| MembershipError::plan_not_found(record.plan_id))?;
        Ok((account, plan))
    }

    /// Writes the period, re-reading the account after a version conflict.
    ///
    /// A concurrent delivery of the same payment that wrote first shows up
    /// in the fresh read, and its period is returned without another write.
    async fn grant_period(
        &self,
        mut account: Account,
        plan: &SubscriptionPlan,
        payment_id: PaymentId,
    ) -> Result<(PeriodChange, MembershipPeriod), MembershipError> {
        let start = Timestamp::now();
        let end = plan.duration.end_date(start);
        let mut attempt = 1;
        loop {
            let (change, period) = account.grant_paid_period(plan.id, payment_id, start, end);
            if change == PeriodChange::Unchanged {
                tracing::info!(payment_id = %payment_id, account_id = %account.id, "Period already granted by this payment");
                return Ok((change, period));
            }
            match self.accounts.update(&account).await {
                Ok(()) => return Ok((change, period)),
                Err(err) if err.is_concurrent_modification() && attempt < MAX_GRANT_ATTEMPTS => {
                    tracing::debug!(account_id = %account.id, attempt, "Account version conflict; retrying");
                    attempt += 1;
                    account = self
                        .accounts
                        .find_by_id(&account.id)
                        .await?
                        .ok_or_else(|| MembershipError::account_not_found(account.id))?;
                }
                Err(err) => return Err(MembershipError::infrastructure(err.to_string())),
            }
        }
    }

    /// Best-effort `pending -> failed`; never masks the caller's error.
    async fn fail_payment(&self, payment_id: PaymentId) {
        match self.payments.settle_failed(&payment_id, Timestamp::now()).await {
            Ok(SettleOutcome::Applied) => {
                tracing::info!(payment_id = %payment_id, "Payment marked failed");
            }
            Ok(other) => {
                tracing::debug!(payment_id = %payment_id, outcome = ?other, "Payment not pending; left as is");
            }
            Err(err) => {
                tracing::warn!(payment_id = %payment_id, error = %err, "Could not mark payment failed");
            }
        }
    }

    async fn report_inconsistency(
        &self,
        record: &PaymentRecord,
        reason: impl Into<String>,
    ) -> Result<HandlePaymentCallbackResult, MembershipError> {
        let reason = reason.into();
        tracing::error!(
            payment_id = %record.id,
            account_id = %record.account_id,
            plan_id = %record.plan_id,
            reason = %reason,
            "Membership granted but payment not settled"
        );
        notify_quietly(
            self.notifier.as_ref(),
            &NotificationTarget::Operator,
            NotificationKind::OperatorAlert,
            json!({
                "payment_id": record.id,
                "account_id": record.account_id,
                "plan_id": record.plan_id,
                "reason": reason,
            }),
        )
        .await;
        Err(MembershipError::inconsistency(record.id, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryAccountRepository, InMemoryPaymentRepository, InMemoryPlanRepository};
    use crate::adapters::notification::RecordingNotifier;
    use crate::domain::catalog::{PlanDuration, RenewalType};
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::domain::membership::PeriodStatus;
    use crate::domain::payment::GatewayMetadata;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Barrier;

    // ════════════════════════════════════════════════════════════════════════════
    // Test doubles
    // ════════════════════════════════════════════════════════════════════════════

    /// Rejects the first `conflicts` updates as concurrent modifications.
    struct ConflictingAccounts {
        inner: InMemoryAccountRepository,
        conflicts: Mutex<u32>,
    }

    #[async_trait]
    impl AccountRepository for ConflictingAccounts {
        async fn insert(&self, account: &Account) -> Result<(), DomainError> {
            self.inner.insert(account).await
        }

        async fn update(&self, account: &Account) -> Result<(), DomainError> {
            {
                let mut left = self.conflicts.lock().unwrap();
                if *left > 0 {
                    *left -= 1;
                    return Err(DomainError::new(ErrorCode::ConcurrentModification, "stale"));
                }
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

    /// Holds the first `gated` account reads at a barrier so concurrent
    /// deliveries all see the same pre-grant account.
    struct GatedAccounts {
        inner: InMemoryAccountRepository,
        barrier: Barrier,
        gated: AtomicUsize,
    }

    impl GatedAccounts {
        fn new(inner: InMemoryAccountRepository, deliveries: usize) -> Self {
            Self {
                inner,
                barrier: Barrier::new(deliveries),
                gated: AtomicUsize::new(deliveries),
            }
        }
    }

    #[async_trait]
    impl AccountRepository for GatedAccounts {
        async fn insert(&self, account: &Account) -> Result<(), DomainError> {
            self.inner.insert(account).await
        }

        async fn update(&self, account: &Account) -> Result<(), DomainError> {
            self.inner.update(account).await
        }

        async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
            let found = self.inner.find_by_id(id).await;
            let held = self
                .gated
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if held {
                self.barrier.wait().await;
            }
            found
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

    #[derive(Clone, Copy)]
    enum SettleBehaviour {
        Fail,
        /// Another delivery settles the payment just before this one.
        LoseRace,
    }

    struct SettlingPayments {
        inner: InMemoryPaymentRepository,
        behaviour: SettleBehaviour,
    }

    #[async_trait]
    impl PaymentRepository for SettlingPayments {
        async fn insert(&self, record: &PaymentRecord) -> Result<(), DomainError> {
            self.inner.insert(record).await
        }

        async fn find_by_id(&self, id: &PaymentId) -> Result<Option<PaymentRecord>, DomainError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_account(&self, account_id: &AccountId) -> Result<Vec<PaymentRecord>, DomainError> {
            self.inner.find_by_account(account_id).await
        }

        async fn find_all(&self) -> Result<Vec<PaymentRecord>, DomainError> {
            self.inner.find_all().await
        }

        async fn find_pending_created_before(&self, t: Timestamp) -> Result<Vec<PaymentRecord>, DomainError> {
            self.inner.find_pending_created_before(t).await
        }

        async fn settle_success(
            &self,
            id: &PaymentId,
            metadata: &GatewayMetadata,
            at: Timestamp,
        ) -> Result<SettleOutcome, DomainError> {
            match self.behaviour {
                SettleBehaviour::Fail => Err(DomainError::database("connection reset")),
                SettleBehaviour::LoseRace => {
                    self.inner.settle_success(id, metadata, at).await?;
                    self.inner.settle_success(id, metadata, at).await
                }
            }
        }

        async fn settle_failed(&self, id: &PaymentId, at: Timestamp) -> Result<SettleOutcome, DomainError> {
            self.inner.settle_failed(id, at).await
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Fixture
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        accounts: InMemoryAccountRepository,
        plans: InMemoryPlanRepository,
        payments: InMemoryPaymentRepository,
        notifier: RecordingNotifier,
        account: Account,
        plan: SubscriptionPlan,
    }

    impl Fixture {
        async fn new() -> Self {
            let accounts = InMemoryAccountRepository::new();
            let plans = InMemoryPlanRepository::new();
            let account =
                Account::register(AccountId::new(), "ada", "ada@example.com", "Ada Obi", None).unwrap();
            let plan =
                SubscriptionPlan::new(PlanId::new(), "Monthly", PlanDuration::OneMonth, 1_500_000, RenewalType::Manual)
                    .unwrap();
            accounts.insert(&account).await.unwrap();
            plans.save(&plan).await.unwrap();
            Self {
                accounts,
                plans,
                payments: InMemoryPaymentRepository::new(),
                notifier: RecordingNotifier::new(),
                account,
                plan,
            }
        }

        fn handler(&self) -> HandlePaymentCallbackHandler {
            HandlePaymentCallbackHandler::new(
                Arc::new(self.accounts.clone()),
                Arc::new(self.plans.clone()),
                Arc::new(self.payments.clone()),
                Arc::new(self.notifier.clone()),
            )
        }

        async fn pending_payment(&self) -> PaymentRecord {
            let record = PaymentRecord::initiate(PaymentId::new(), self.account.id, &self.plan, Timestamp::now());
            self.payments.insert(&record).await.unwrap();
            record
        }

        async fn stored_account(&self) -> Account {
            self.accounts.get(&self.account.id).await.unwrap()
        }
    }

    fn callback(payment_id: PaymentId, status: &str) -> HandlePaymentCallbackCommand {
        HandlePaymentCallbackCommand {
            event: CallbackEvent {
                tx_ref: payment_id.to_string(),
                status: status.to_string(),
                gateway_reference: Some("FLW-MOCK-42".to_string()),
                payment_method: Some("card".to_string()),
                transaction_id: Some("4242".to_string()),
                occurred_at: None,
            },
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Happy path and replays
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn successful_callback_grants_period_and_settles_payment() {
        let fx = Fixture::new().await;
        let payment = fx.pending_payment().await;

        let result = fx.handler().handle(callback(payment.id, "successful")).await.unwrap();

        let HandlePaymentCallbackResult::MembershipActivated { start_date, end_date, change, .. } = result else {
            panic!("expected activation, got {:?}", result);
        };
        assert_eq!(change, PeriodChange::Appended);
        assert_eq!(end_date, PlanDuration::OneMonth.end_date(start_date));

        let stored = fx.payments.get(&payment.id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Success);
        assert_eq!(stored.gateway.payment_reference.as_deref(), Some("FLW-MOCK-42"));
        assert_eq!(stored.gateway.transaction_id.as_deref(), Some("4242"));

        let account = fx.stored_account().await;
        let period = account.period_for(fx.plan.id).unwrap();
        assert_eq!(period.status, PeriodStatus::Active);
        assert_eq!(period.end_date, end_date);
    }

    #[tokio::test]
    async fn replayed_callback_is_a_no_op() {
        let fx = Fixture::new().await;
        let payment = fx.pending_payment().await;
        let handler = fx.handler();

        handler.handle(callback(payment.id, "successful")).await.unwrap();
        let after_first = fx.stored_account().await;

        let second = handler.handle(callback(payment.id, "successful")).await.unwrap();
        assert_eq!(second, HandlePaymentCallbackResult::AlreadyProcessed { payment_id: payment.id });
        assert_eq!(fx.stored_account().await, after_first);
    }

    #[tokio::test]
    async fn resubscribing_replaces_the_existing_period() {
        let fx = Fixture::new().await;
        let handler = fx.handler();

        let first = fx.pending_payment().await;
        handler.handle(callback(first.id, "successful")).await.unwrap();

        let second = fx.pending_payment().await;
        let result = handler.handle(callback(second.id, "successful")).await.unwrap();

        assert!(matches!(
            result,
            HandlePaymentCallbackResult::MembershipActivated { change: PeriodChange::Replaced, .. }
        ));
        assert_eq!(fx.stored_account().await.membership_periods.len(), 1);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Rejections
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unsuccessful_status_fails_payment_and_leaves_ledger() {
        let fx = Fixture::new().await;
        let payment = fx.pending_payment().await;

        let err = fx.handler().handle(callback(payment.id, "cancelled")).await.unwrap_err();

        assert!(matches!(err, MembershipError::PaymentRejected { .. }));
        assert_eq!(fx.payments.get(&payment.id).await.unwrap().status, PaymentStatus::Failed);
        assert!(fx.stored_account().await.membership_periods.is_empty());
    }

    #[tokio::test]
    async fn failed_payment_is_never_revived() {
        let fx = Fixture::new().await;
        let payment = fx.pending_payment().await;
        let handler = fx.handler();
        let _ = handler.handle(callback(payment.id, "failed")).await;

        let err = handler.handle(callback(payment.id, "successful")).await.unwrap_err();

        assert!(matches!(err, MembershipError::PaymentRejected { .. }));
        assert_eq!(fx.payments.get(&payment.id).await.unwrap().status, PaymentStatus::Failed);
        assert!(fx.stored_account().await.membership_periods.is_empty());
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let fx = Fixture::new().await;

        let err = fx.handler().handle(callback(PaymentId::new(), "successful")).await.unwrap_err();
        assert!(matches!(err, MembershipError::NotFound { entity: "payment", .. }));

        let mut garbage = callback(PaymentId::new(), "successful");
        garbage.event.tx_ref = "not-a-reference".to_string();
        assert!(fx.handler().handle(garbage).await.is_err());
    }

    #[tokio::test]
    async fn deleted_plan_fails_payment() {
        let fx = Fixture::new().await;
        let payment = fx.pending_payment().await;
        fx.plans.delete(&fx.plan.id).await.unwrap();

        let err = fx.handler().handle(callback(payment.id, "successful")).await.unwrap_err();

        assert!(matches!(err, MembershipError::NotFound { entity: "plan", .. }));
        assert_eq!(fx.payments.get(&payment.id).await.unwrap().status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn missing_account_fails_payment() {
        let fx = Fixture::new().await;
        let orphan = PaymentRecord::initiate(PaymentId::new(), AccountId::new(), &fx.plan, Timestamp::now());
        fx.payments.insert(&orphan).await.unwrap();

        let err = fx.handler().handle(callback(orphan.id, "successful")).await.unwrap_err();

        assert!(matches!(err, MembershipError::NotFound { entity: "account", .. }));
        assert_eq!(fx.payments.get(&orphan.id).await.unwrap().status, PaymentStatus::Failed);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Concurrency and partial failure
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn version_conflict_is_retried_with_fresh_read() {
        let fx = Fixture::new().await;
        let payment = fx.pending_payment().await;
        let handler = HandlePaymentCallbackHandler::new(
            Arc::new(ConflictingAccounts {
                inner: fx.accounts.clone(),
                conflicts: Mutex::new(2),
            }),
            Arc::new(fx.plans.clone()),
            Arc::new(fx.payments.clone()),
            Arc::new(fx.notifier.clone()),
        );

        handler.handle(callback(payment.id, "successful")).await.unwrap();
        assert!(fx.stored_account().await.has_active_period_for(fx.plan.id));
    }

    #[tokio::test]
    async fn persistent_conflict_leaves_payment_pending() {
        let fx = Fixture::new().await;
        let payment = fx.pending_payment().await;
        let handler = HandlePaymentCallbackHandler::new(
            Arc::new(ConflictingAccounts {
                inner: fx.accounts.clone(),
                conflicts: Mutex::new(MAX_GRANT_ATTEMPTS),
            }),
            Arc::new(fx.plans.clone()),
            Arc::new(fx.payments.clone()),
            Arc::new(fx.notifier.clone()),
        );

        let err = handler.handle(callback(payment.id, "successful")).await.unwrap_err();

        assert!(matches!(err, MembershipError::Infrastructure(_)));
        assert!(err.is_retryable());
        assert_eq!(fx.payments.get(&payment.id).await.unwrap().status, PaymentStatus::Pending);
        assert!(fx.stored_account().await.membership_periods.is_empty());
    }

    #[tokio::test]
    async fn settle_failure_reports_inconsistency_to_operator() {
        let fx = Fixture::new().await;
        let payment = fx.pending_payment().await;
        let handler = HandlePaymentCallbackHandler::new(
            Arc::new(fx.accounts.clone()),
            Arc::new(fx.plans.clone()),
            Arc::new(SettlingPayments {
                inner: fx.payments.clone(),
                behaviour: SettleBehaviour::Fail,
            }),
            Arc::new(fx.notifier.clone()),
        );

        let err = handler.handle(callback(payment.id, "successful")).await.unwrap_err();

        assert!(matches!(err, MembershipError::Inconsistency { .. }));
        assert_eq!(fx.notifier.count(NotificationKind::OperatorAlert), 1);
        assert_eq!(fx.notifier.sent()[0].target, NotificationTarget::Operator);
        // Membership was granted; a redelivery will settle the payment
        assert!(fx.stored_account().await.has_active_period_for(fx.plan.id));
        assert_eq!(fx.payments.get(&payment.id).await.unwrap().status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn redelivery_after_inconsistency_reconciles() {
        let fx = Fixture::new().await;
        let payment = fx.pending_payment().await;
        let broken = HandlePaymentCallbackHandler::new(
            Arc::new(fx.accounts.clone()),
            Arc::new(fx.plans.clone()),
            Arc::new(SettlingPayments {
                inner: fx.payments.clone(),
                behaviour: SettleBehaviour::Fail,
            }),
            Arc::new(fx.notifier.clone()),
        );
        let _ = broken.handle(callback(payment.id, "successful")).await;
        let granted = fx.stored_account().await;

        let result = fx.handler().handle(callback(payment.id, "successful")).await.unwrap();

        let HandlePaymentCallbackResult::MembershipActivated { start_date, change, .. } = result else {
            panic!("expected activation, got {:?}", result);
        };
        assert_eq!(change, PeriodChange::Unchanged);
        assert_eq!(start_date, granted.membership_periods[0].start_date);
        assert_eq!(fx.payments.get(&payment.id).await.unwrap().status, PaymentStatus::Success);
        assert_eq!(fx.stored_account().await, granted);
    }

    #[tokio::test]
    async fn losing_the_settle_race_is_an_idempotent_ack() {
        let fx = Fixture::new().await;
        let payment = fx.pending_payment().await;
        let handler = HandlePaymentCallbackHandler::new(
            Arc::new(fx.accounts.clone()),
            Arc::new(fx.plans.clone()),
            Arc::new(SettlingPayments {
                inner: fx.payments.clone(),
                behaviour: SettleBehaviour::LoseRace,
            }),
            Arc::new(fx.notifier.clone()),
        );

        let result = handler.handle(callback(payment.id, "successful")).await.unwrap();

        assert_eq!(result, HandlePaymentCallbackResult::AlreadyProcessed { payment_id: payment.id });
        assert!(fx.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn concurrent_deliveries_write_the_ledger_once() {
        let fx = Fixture::new().await;
        let payment = fx.pending_payment().await;
        let accounts = Arc::new(GatedAccounts::new(fx.accounts.clone(), 2));
        let delivery = || {
            HandlePaymentCallbackHandler::new(
                accounts.clone(),
                Arc::new(fx.plans.clone()),
                Arc::new(fx.payments.clone()),
                Arc::new(fx.notifier.clone()),
            )
        };
        let (first_handler, second_handler) = (delivery(), delivery());

        let (first, second) = tokio::join!(
            first_handler.handle(callback(payment.id, "successful")),
            second_handler.handle(callback(payment.id, "successful")),
        );
        let results = [first.unwrap(), second.unwrap()];

        let stored = fx.stored_account().await;
        assert_eq!(stored.version, 1);
        assert_eq!(stored.membership_periods.len(), 1);
        let period = &stored.membership_periods[0];
        assert_eq!(period.granted_by, Some(payment.id));

        let activated: Vec<_> = results
            .iter()
            .filter_map(|r| match r {
                HandlePaymentCallbackResult::MembershipActivated { start_date, end_date, .. } => {
                    Some((*start_date, *end_date))
                }
                HandlePaymentCallbackResult::AlreadyProcessed { .. } => None,
            })
            .collect();
        assert_eq!(activated, vec![(period.start_date, period.end_date)]);
        assert!(results.contains(&HandlePaymentCallbackResult::AlreadyProcessed { payment_id: payment.id }));
        assert_eq!(fx.payments.get(&payment.id).await.unwrap().status, PaymentStatus::Success);
        assert!(fx.notifier.sent().is_empty());
    }
}
