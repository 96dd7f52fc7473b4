//! HTTP handlers for payment endpoints.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::adapters::flutterwave::SIGNATURE_HEADER;
use crate::adapters::http::error::{parse_id, ApiError};
use crate::adapters::http::state::AppState;
use crate::application::handlers::membership::{
    GetPaymentHistoryQuery, HandlePaymentCallbackCommand, InitiatePaymentCommand,
};
use crate::domain::membership::MembershipError;

use super::dto::{InitiatePaymentRequest, InitiatePaymentResponse, WebhookResponse};

/// POST /api/payment - Record a pending payment and return the checkout link
pub async fn initiate_payment(
    State(state): State<AppState>,
    payload: Result<Json<InitiatePaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let cmd = InitiatePaymentCommand {
        account_id: parse_id("account_id", &request.account_id)?,
        plan_id: parse_id("plan_id", &request.plan_id)?,
    };

    let result = state.initiate_payment_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(InitiatePaymentResponse::from(result))))
}

/// POST /api/payment/webhook - Reconcile a gateway callback
///
/// Replays of an already settled payment answer 200 so the gateway stops
/// retrying.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    let event = state
        .gateway
        .parse_callback(&body, signature)
        .map_err(MembershipError::from)?;

    tracing::info!(tx_ref = %event.tx_ref, status = %event.status, "Payment callback received");

    let result = state
        .payment_callback_handler()
        .handle(HandlePaymentCallbackCommand { event })
        .await?;

    Ok(Json(WebhookResponse::from(&result)))
}

/// GET /api/payment - Payment history across all accounts
pub async fn list_payment_history(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let history = state
        .payment_history_handler()
        .handle(GetPaymentHistoryQuery::All)
        .await?;
    Ok(Json(history))
}

/// GET /api/payment/:account_id - Payment history for one account
pub async fn account_payment_history(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let account_id = parse_id("account_id", &account_id)?;
    let history = state
        .payment_history_handler()
        .handle(GetPaymentHistoryQuery::ForAccount(account_id))
        .await?;
    Ok(Json(history))
}
