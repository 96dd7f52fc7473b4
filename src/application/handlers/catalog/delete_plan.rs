//! DeletePlanHandler - Command handler for removing a subscription plan.

use std::sync::Arc;

use crate::domain::foundation::{AccountId, PlanId};
use crate::domain::membership::MembershipError;
use crate::ports::{AccountRepository, PlanRepository};

const MAX_DETACH_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct DeletePlanCommand {
    pub plan_id: PlanId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePlanResult {
    pub plan_id: PlanId,
    /// Accounts that held a period for the plan. Zero is a normal outcome.
    pub accounts_detached: usize,
}

/// Handler for deleting subscription plans.
///
/// Periods for the plan are removed from every account before the plan
/// itself, so a failure part-way can be retried by deleting again.
/// Payment records keep their `plan_id` and show no plan summary afterwards.
pub struct DeletePlanHandler {
    plans: Arc<dyn PlanRepository>,
    accounts: Arc<dyn AccountRepository>,
}

impl DeletePlanHandler {
    pub fn new(plans: Arc<dyn PlanRepository>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self { plans, accounts }
    }

    pub async fn handle(&self, cmd: DeletePlanCommand) -> Result<DeletePlanResult, MembershipError> {
        if self.plans.find_by_id(&cmd.plan_id).await?.is_none() {
            return Err(MembershipError::plan_not_found(cmd.plan_id));
        }

        let holders = self.accounts.find_by_plan(&cmd.plan_id).await?;
        let mut accounts_detached = 0;
        for account in holders {
            if self.detach(account.id, cmd.plan_id).await? {
                accounts_detached += 1;
            }
        }

        if !self.plans.delete(&cmd.plan_id).await? {
            return Err(MembershipError::plan_not_found(cmd.plan_id));
        }

        tracing::info!(plan_id = %cmd.plan_id, accounts_detached, "Subscription plan deleted");
        Ok(DeletePlanResult {
            plan_id: cmd.plan_id,
            accounts_detached,
        })
    }

    async fn detach(&self, account_id: AccountId, plan_id: PlanId) -> Result<bool, MembershipError> {
        let mut attempt = 1;
        loop {
            let Some(mut account) = self.accounts.find_by_id(&account_id).await? else {
                return Ok(false);
            };
            if !account.detach_plan(plan_id) {
                return Ok(false);
            }
            match self.accounts.update(&account).await {
                Ok(()) => return Ok(true),
                Err(err) if err.is_concurrent_modification() && attempt < MAX_DETACH_ATTEMPTS => {
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryAccountRepository, InMemoryPlanRepository};
    use crate::domain::catalog::{PlanDuration, RenewalType, SubscriptionPlan};
    use crate::domain::foundation::Timestamp;
    use crate::domain::membership::Account;

    async fn setup() -> (InMemoryPlanRepository, InMemoryAccountRepository, SubscriptionPlan) {
        let plans = InMemoryPlanRepository::new();
        let plan =
            SubscriptionPlan::new(PlanId::new(), "Daily", PlanDuration::OneDay, 2_000, RenewalType::Manual).unwrap();
        plans.save(&plan).await.unwrap();
        (plans, InMemoryAccountRepository::new(), plan)
    }

    #[tokio::test]
    async fn delete_without_subscribers_reports_zero() {
        let (plans, accounts, plan) = setup().await;
        let handler = DeletePlanHandler::new(Arc::new(plans.clone()), Arc::new(accounts));

        let result = handler.handle(DeletePlanCommand { plan_id: plan.id }).await.unwrap();

        assert_eq!(result.accounts_detached, 0);
        assert!(plans.find_by_id(&plan.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_detaches_periods_and_keeps_others() {
        let (plans, accounts, plan) = setup().await;
        let other = PlanId::new();
        let now = Timestamp::now();

        let mut holder = Account::register(AccountId::new(), "ada", "ada@example.com", "Ada", None).unwrap();
        holder.grant_period(plan.id, now, now.add_days(1));
        holder.grant_period(other, now, now.add_days(30));
        accounts.insert(&holder).await.unwrap();

        let bystander = Account::register(AccountId::new(), "tunde", "tunde@example.com", "Tunde", None).unwrap();
        accounts.insert(&bystander).await.unwrap();

        let handler = DeletePlanHandler::new(Arc::new(plans), Arc::new(accounts.clone()));
        let result = handler.handle(DeletePlanCommand { plan_id: plan.id }).await.unwrap();

        assert_eq!(result.accounts_detached, 1);
        let stored = accounts.get(&holder.id).await.unwrap();
        assert!(stored.period_for(plan.id).is_none());
        assert!(stored.has_active_period_for(other));
    }

    #[tokio::test]
    async fn unknown_plan_is_not_found() {
        let (plans, accounts, _) = setup().await;
        let handler = DeletePlanHandler::new(Arc::new(plans), Arc::new(accounts));

        let err = handler
            .handle(DeletePlanCommand { plan_id: PlanId::new() })
            .await
            .unwrap_err();
        assert!(matches!(err, MembershipError::NotFound { entity: "plan", .. }));
    }
}
