//! In-memory subscription plan repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::catalog::SubscriptionPlan;
use crate::domain::foundation::{DomainError, ErrorCode, PlanId};
use crate::ports::PlanRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanRepository {
    plans: Arc<RwLock<HashMap<PlanId, SubscriptionPlan>>>,
}

impl InMemoryPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn save(&self, plan: &SubscriptionPlan) -> Result<(), DomainError> {
        self.plans.write().await.insert(plan.id, plan.clone());
        Ok(())
    }

    async fn update(&self, plan: &SubscriptionPlan) -> Result<(), DomainError> {
        let mut plans = self.plans.write().await;
        match plans.get_mut(&plan.id) {
            Some(stored) => {
                *stored = plan.clone();
                Ok(())
            }
            None => Err(DomainError::new(ErrorCode::PlanNotFound, "Plan not found")
                .with_detail("id", plan.id.to_string())),
        }
    }

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<SubscriptionPlan>, DomainError> {
        Ok(self.plans.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<SubscriptionPlan>, DomainError> {
        let mut plans: Vec<SubscriptionPlan> = self.plans.read().await.values().cloned().collect();
        plans.sort_by_key(|p| p.created_at);
        Ok(plans)
    }

    async fn delete(&self, id: &PlanId) -> Result<bool, DomainError> {
        Ok(self.plans.write().await.remove(id).is_some())
    }
}
