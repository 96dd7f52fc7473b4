//! Axum router configuration for attendance endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{clock_in, clock_out, clocked_in_report};

/// Create the attendance router.
///
/// # Routes
///
/// - `POST /in/:account_id` - Clock in for today
/// - `POST /out/:account_id` - Clock out for today
/// - `GET /` - Members who clocked in within a date range
pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(clocked_in_report))
        .route("/in/:account_id", post(clock_in))
        .route("/out/:account_id", post(clock_out))
}
