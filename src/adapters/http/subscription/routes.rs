//! Axum router configuration for subscription plan endpoints.

use axum::{routing::get, Router};

use crate::adapters::http::state::AppState;

use super::handlers::{create_plan, delete_plan, get_plan, list_plans, update_plan};

/// Create the subscription catalog router.
///
/// # Routes
///
/// - `GET /` - List plans
/// - `POST /` - Create a plan
/// - `GET /:id` - Get a plan
/// - `PUT /:id` - Update a plan
/// - `DELETE /:id` - Delete a plan
pub fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_plans).post(create_plan))
        .route("/:id", get(get_plan).put(update_plan).delete(delete_plan))
}
