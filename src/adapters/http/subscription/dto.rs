//! HTTP DTOs for subscription plan endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::catalog::DeletePlanResult;
use crate::domain::catalog::SubscriptionPlan;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create a plan.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanRequest {
    pub name: String,
    /// One of `1 day`, `1 month`, `3 months`, `6 months`, `1 year`.
    pub duration: String,
    pub price: i64,
    #[serde(default)]
    pub renewal_type: Option<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePlanRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub renewal_type: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub id: String,
    pub name: String,
    pub duration: String,
    pub price: i64,
    pub renewal_type: String,
    /// ISO 8601
    pub created_at: String,
    /// ISO 8601
    pub updated_at: String,
}

impl From<SubscriptionPlan> for PlanResponse {
    fn from(plan: SubscriptionPlan) -> Self {
        Self {
            id: plan.id.to_string(),
            name: plan.name,
            duration: plan.duration.code().to_string(),
            price: plan.price,
            renewal_type: plan.renewal_type.as_str().to_string(),
            created_at: plan.created_at.as_datetime().to_rfc3339(),
            updated_at: plan.updated_at.as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEnvelope {
    pub success: bool,
    pub subscription: PlanResponse,
}

impl PlanEnvelope {
    pub fn new(plan: SubscriptionPlan) -> Self {
        Self {
            success: true,
            subscription: plan.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanListResponse {
    pub success: bool,
    pub subscriptions: Vec<PlanResponse>,
}

impl From<Vec<SubscriptionPlan>> for PlanListResponse {
    fn from(plans: Vec<SubscriptionPlan>) -> Self {
        Self {
            success: true,
            subscriptions: plans.into_iter().map(PlanResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePlanResponse {
    pub success: bool,
    pub message: String,
    /// Accounts whose periods for the plan were removed.
    pub accounts_detached: usize,
}

impl From<DeletePlanResult> for DeletePlanResponse {
    fn from(result: DeletePlanResult) -> Self {
        Self {
            success: true,
            message: "Subscription deleted successfully and removed from users".to_string(),
            accounts_detached: result.accounts_detached,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{PlanDuration, RenewalType};
    use crate::domain::foundation::PlanId;

    #[test]
    fn plan_response_uses_wire_codes() {
        let plan = SubscriptionPlan::new(
            PlanId::new(),
            "Quarterly",
            PlanDuration::ThreeMonths,
            2_500_000,
            RenewalType::Automatic,
        )
        .unwrap();

        let response = PlanResponse::from(plan);
        assert_eq!(response.duration, "3 months");
        assert_eq!(response.renewal_type, "automatic");
    }

    #[test]
    fn update_request_accepts_partial_body() {
        let request: UpdatePlanRequest = serde_json::from_str(r#"{"price": 900}"#).unwrap();
        assert_eq!(request.price, Some(900));
        assert!(request.name.is_none());
        assert!(request.duration.is_none());
    }
}
