//! Shared application state for the HTTP layer.

use std::sync::Arc;

use crate::application::handlers::attendance::{ClockInHandler, ClockOutHandler, ListClockedInHandler};
use crate::application::handlers::catalog::{
    CreatePlanHandler, DeletePlanHandler, GetPlanHandler, ListPlansHandler, UpdatePlanHandler,
};
use crate::application::handlers::membership::{
    GetPaymentHistoryHandler, HandlePaymentCallbackHandler, InitiatePaymentHandler,
};
use crate::ports::{AccountRepository, Notifier, PaymentGateway, PaymentRepository, PlanRepository};

/// Shared application state containing all dependencies.
///
/// Cloned for each request; every collaborator is Arc-wrapped and built once
/// at startup.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountRepository>,
    pub plans: Arc<dyn PlanRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        plans: Arc<dyn PlanRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            accounts,
            plans,
            payments,
            gateway,
            notifier,
        }
    }

    // Payments

    pub fn initiate_payment_handler(&self) -> InitiatePaymentHandler {
        InitiatePaymentHandler::new(
            self.accounts.clone(),
            self.plans.clone(),
            self.payments.clone(),
            self.gateway.clone(),
        )
    }

    pub fn payment_callback_handler(&self) -> HandlePaymentCallbackHandler {
        HandlePaymentCallbackHandler::new(
            self.accounts.clone(),
            self.plans.clone(),
            self.payments.clone(),
            self.notifier.clone(),
        )
    }

    pub fn payment_history_handler(&self) -> GetPaymentHistoryHandler {
        GetPaymentHistoryHandler::new(self.accounts.clone(), self.plans.clone(), self.payments.clone())
    }

    // Catalog

    pub fn list_plans_handler(&self) -> ListPlansHandler {
        ListPlansHandler::new(self.plans.clone())
    }

    pub fn get_plan_handler(&self) -> GetPlanHandler {
        GetPlanHandler::new(self.plans.clone())
    }

    pub fn create_plan_handler(&self) -> CreatePlanHandler {
        CreatePlanHandler::new(self.plans.clone())
    }

    pub fn update_plan_handler(&self) -> UpdatePlanHandler {
        UpdatePlanHandler::new(self.plans.clone(), self.accounts.clone())
    }

    pub fn delete_plan_handler(&self) -> DeletePlanHandler {
        DeletePlanHandler::new(self.plans.clone(), self.accounts.clone())
    }

    // Attendance

    pub fn clock_in_handler(&self) -> ClockInHandler {
        ClockInHandler::new(self.accounts.clone())
    }

    pub fn clock_out_handler(&self) -> ClockOutHandler {
        ClockOutHandler::new(self.accounts.clone())
    }

    pub fn clocked_in_report_handler(&self) -> ListClockedInHandler {
        ListClockedInHandler::new(self.accounts.clone())
    }
}
