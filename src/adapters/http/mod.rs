//! HTTP adapters - REST API implementations.
//!
//! Each area has its own dto/handlers/routes module; `app_router` mounts
//! them under `/api` and applies the shared tower-http layers.

pub mod attendance;
pub mod error;
pub mod payment;
pub mod state;
pub mod subscription;

pub use error::{ApiError, ErrorResponse};
pub use state::AppState;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

use attendance::attendance_routes;
use payment::payment_routes;
use subscription::subscription_routes;

/// Build the complete application router.
///
/// # Routes
///
/// - `/api/payment` - Checkout, gateway webhook and payment history
/// - `/api/subscription` - Plan catalog
/// - `/api/attendance` - Clock-in/out and the attendance report
/// - `GET /health` - Liveness
pub fn app_router(state: AppState, server: &ServerConfig) -> Router {
    let api = Router::new()
        .nest("/payment", payment_routes())
        .nest("/subscription", subscription_routes())
        .nest("/attendance", attendance_routes());

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .with_state(state)
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(cors_layer(server))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Any origin when none are configured (development), otherwise the list.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}
