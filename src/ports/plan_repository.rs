//! Subscription plan repository port.

use async_trait::async_trait;

use crate::domain::catalog::SubscriptionPlan;
use crate::domain::foundation::{DomainError, PlanId};

/// Repository port for the subscription catalog.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn save(&self, plan: &SubscriptionPlan) -> Result<(), DomainError>;

    /// # Errors
    ///
    /// - `PlanNotFound` if the plan doesn't exist
    async fn update(&self, plan: &SubscriptionPlan) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<SubscriptionPlan>, DomainError>;

    /// All plans, oldest first.
    async fn list(&self) -> Result<Vec<SubscriptionPlan>, DomainError>;

    /// Removes the plan. Returns false if it did not exist.
    async fn delete(&self, id: &PlanId) -> Result<bool, DomainError>;
}
