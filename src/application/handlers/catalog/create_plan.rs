//! CreatePlanHandler - Command handler for adding a subscription plan.

use std::sync::Arc;

use crate::domain::catalog::{PlanDuration, RenewalType, SubscriptionPlan};
use crate::domain::foundation::PlanId;
use crate::domain::membership::MembershipError;
use crate::ports::PlanRepository;

/// Command to create a plan. Duration and renewal type arrive as their
/// wire codes (`"1 month"`, `"manual"`).
#[derive(Debug, Clone)]
pub struct CreatePlanCommand {
    pub name: String,
    pub duration: String,
    pub price: i64,
    pub renewal_type: Option<String>,
}

/// Handler for creating subscription plans.
pub struct CreatePlanHandler {
    plans: Arc<dyn PlanRepository>,
}

impl CreatePlanHandler {
    pub fn new(plans: Arc<dyn PlanRepository>) -> Self {
        Self { plans }
    }

    pub async fn handle(&self, cmd: CreatePlanCommand) -> Result<SubscriptionPlan, MembershipError> {
        let duration: PlanDuration = cmd.duration.parse()?;
        let renewal_type = match cmd.renewal_type.as_deref() {
            Some(code) => code.parse::<RenewalType>()?,
            None => RenewalType::default(),
        };

        let plan = SubscriptionPlan::new(PlanId::new(), cmd.name, duration, cmd.price, renewal_type)?;
        self.plans.save(&plan).await?;

        tracing::info!(plan_id = %plan.id, name = %plan.name, duration = %plan.duration, "Subscription plan created");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPlanRepository;

    fn command(name: &str, duration: &str, price: i64) -> CreatePlanCommand {
        CreatePlanCommand {
            name: name.to_string(),
            duration: duration.to_string(),
            price,
            renewal_type: None,
        }
    }

    #[tokio::test]
    async fn creates_plan_with_manual_renewal_by_default() {
        let repo = InMemoryPlanRepository::new();
        let handler = CreatePlanHandler::new(Arc::new(repo.clone()));

        let plan = handler.handle(command("Quarterly", "3 months", 40_000)).await.unwrap();

        assert_eq!(plan.duration, PlanDuration::ThreeMonths);
        assert_eq!(plan.renewal_type, RenewalType::Manual);
        assert_eq!(repo.find_by_id(&plan.id).await.unwrap(), Some(plan));
    }

    #[tokio::test]
    async fn explicit_renewal_type_is_kept() {
        let handler = CreatePlanHandler::new(Arc::new(InMemoryPlanRepository::new()));
        let mut cmd = command("Yearly", "1 year", 400_000);
        cmd.renewal_type = Some("automatic".to_string());

        let plan = handler.handle(cmd).await.unwrap();
        assert_eq!(plan.renewal_type, RenewalType::Automatic);
    }

    #[tokio::test]
    async fn rejects_invalid_input() {
        let handler = CreatePlanHandler::new(Arc::new(InMemoryPlanRepository::new()));

        for (cmd, field) in [
            (command("  ", "1 day", 100), "name"),
            (command("Fortnight", "2 weeks", 100), "duration"),
            (command("Free", "1 day", 0), "price"),
        ] {
            match handler.handle(cmd).await {
                Err(MembershipError::ValidationFailed { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected validation error on {}, got {:?}", field, other),
            }
        }
    }
}
