//! Axum router configuration for payment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{account_payment_history, initiate_payment, list_payment_history, payment_webhook};

/// Create the payment API router.
///
/// # Routes
///
/// - `POST /` - Initiate a payment for a plan
/// - `GET /` - Payment history across all accounts
/// - `POST /webhook` - Gateway callback (signature verified, no auth)
/// - `GET /:account_id` - Payment history for one account
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(initiate_payment).get(list_payment_history))
        .route("/webhook", post(payment_webhook))
        .route("/:account_id", get(account_payment_history))
}
