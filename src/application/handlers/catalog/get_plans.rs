//! Read-side handlers for the subscription catalog.

use std::sync::Arc;

use crate::domain::catalog::SubscriptionPlan;
use crate::domain::foundation::PlanId;
use crate::domain::membership::MembershipError;
use crate::ports::PlanRepository;

/// Lists every plan, oldest first.
pub struct ListPlansHandler {
    plans: Arc<dyn PlanRepository>,
}

impl ListPlansHandler {
    pub fn new(plans: Arc<dyn PlanRepository>) -> Self {
        Self { plans }
    }

    pub async fn handle(&self) -> Result<Vec<SubscriptionPlan>, MembershipError> {
        Ok(self.plans.list().await?)
    }
}

#[derive(Debug, Clone)]
pub struct GetPlanQuery {
    pub plan_id: PlanId,
}

pub struct GetPlanHandler {
    plans: Arc<dyn PlanRepository>,
}

impl GetPlanHandler {
    pub fn new(plans: Arc<dyn PlanRepository>) -> Self {
        Self { plans }
    }

    pub async fn handle(&self, query: GetPlanQuery) -> Result<SubscriptionPlan, MembershipError> {
        self.plans
            .find_by_id(&query.plan_id)
            .await?
            .ok_or_else(|| MembershipError::plan_not_found(query.plan_id))
    }
}
