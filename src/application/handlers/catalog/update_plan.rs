//! UpdatePlanHandler - Command handler for editing a subscription plan.

use std::sync::Arc;

use crate::domain::catalog::{PlanDuration, RenewalType, SubscriptionPlan};
use crate::domain::foundation::PlanId;
use crate::domain::membership::MembershipError;
use crate::ports::{AccountRepository, PlanRepository};

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdatePlanCommand {
    pub plan_id: PlanId,
    pub name: Option<String>,
    pub duration: Option<String>,
    pub price: Option<i64>,
    pub renewal_type: Option<String>,
}

/// Handler for editing subscription plans.
///
/// Name and price edits never touch recorded payment amounts. The duration
/// cannot change while any account holds an active period for the plan,
/// because that period's end date was computed from the old duration.
pub struct UpdatePlanHandler {
    plans: Arc<dyn PlanRepository>,
    accounts: Arc<dyn AccountRepository>,
}

impl UpdatePlanHandler {
    pub fn new(plans: Arc<dyn PlanRepository>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self { plans, accounts }
    }

    pub async fn handle(&self, cmd: UpdatePlanCommand) -> Result<SubscriptionPlan, MembershipError> {
        let mut plan = self
            .plans
            .find_by_id(&cmd.plan_id)
            .await?
            .ok_or_else(|| MembershipError::plan_not_found(cmd.plan_id))?;

        // Parse everything before mutating so a bad field changes nothing
        let duration = cmd.duration.as_deref().map(str::parse::<PlanDuration>).transpose()?;
        let renewal_type = cmd.renewal_type.as_deref().map(str::parse::<RenewalType>).transpose()?;

        if let Some(name) = cmd.name {
            plan.rename(name)?;
        }
        if let Some(price) = cmd.price {
            plan.reprice(price)?;
        }
        if let Some(renewal_type) = renewal_type {
            plan.set_renewal_type(renewal_type);
        }
        if let Some(duration) = duration.filter(|d| *d != plan.duration) {
            self.ensure_no_active_periods(plan.id).await?;
            plan.change_duration(duration);
        }

        self.plans.update(&plan).await?;
        tracing::info!(plan_id = %plan.id, "Subscription plan updated");
        Ok(plan)
    }

    async fn ensure_no_active_periods(&self, plan_id: PlanId) -> Result<(), MembershipError> {
        let holders = self.accounts.find_by_plan(&plan_id).await?;
        let active = holders.iter().filter(|a| a.has_active_period_for(plan_id)).count();
        if active > 0 {
            return Err(MembershipError::invalid_state(
                format!("plan has {} active membership(s)", active),
                "change duration",
            ));
        }
        Ok(())
    }
}
