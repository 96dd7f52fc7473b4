//! API error type shared by every route module.
//!
//! Converts domain errors into `{ "error": ..., "code": ... }` bodies.
//! Internal failures are logged here and answered with a generic message.

use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::membership::{AttendanceError, MembershipError};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Standard error response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Error code for programmatic handling.
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
        }
    }
}

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    Membership(MembershipError),
    Attendance(AttendanceError),
    /// Request body that could not be read as the expected JSON.
    Body(JsonRejection),
}

impl From<MembershipError> for ApiError {
    fn from(err: MembershipError) -> Self {
        ApiError::Membership(err)
    }
}

impl From<AttendanceError> for ApiError {
    fn from(err: AttendanceError) -> Self {
        ApiError::Attendance(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Membership(MembershipError::from(err))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Membership(err) => match err {
                MembershipError::NotFound { .. } => StatusCode::NOT_FOUND,
                MembershipError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
                MembershipError::PaymentRejected { .. } => StatusCode::PAYMENT_REQUIRED,
                MembershipError::InvalidWebhookSignature => StatusCode::UNAUTHORIZED,
                MembershipError::InvalidState { .. } => StatusCode::CONFLICT,
                MembershipError::GatewayError { .. } => StatusCode::BAD_GATEWAY,
                MembershipError::Inconsistency { .. } | MembershipError::Infrastructure(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Attendance(err) => match err {
                AttendanceError::AccountNotFound(_) => StatusCode::NOT_FOUND,
                AttendanceError::NoActiveMembership => StatusCode::FORBIDDEN,
                AttendanceError::AlreadyClockedIn(_)
                | AttendanceError::NotClockedIn(_)
                | AttendanceError::AlreadyClockedOut(_) => StatusCode::CONFLICT,
                AttendanceError::InvalidRange { .. } => StatusCode::BAD_REQUEST,
                AttendanceError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Body(rejection) => rejection.status(),
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::Membership(err) => ErrorResponse::new(err.code(), err.message()),
            ApiError::Attendance(err) => ErrorResponse::new(err.code(), err.to_string()),
            ApiError::Body(rejection) => ErrorResponse::new(ErrorCode::ValidationFailed, rejection.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = self.body();

        if status.is_server_error() && status != StatusCode::BAD_GATEWAY {
            match &self {
                ApiError::Membership(err) => {
                    tracing::error!(code = %body.code, error = %err, "Request failed")
                }
                ApiError::Attendance(err) => {
                    tracing::error!(code = %body.code, error = %err, "Request failed")
                }
                ApiError::Body(rejection) => {
                    tracing::error!(code = %body.code, error = %rejection.body_text(), "Request failed")
                }
            }
            body.error = INTERNAL_ERROR_MESSAGE.to_string();
        }

        (status, Json(body)).into_response()
    }
}

/// Parses a path or body identifier, reporting the field on failure.
pub fn parse_id<T: FromStr>(field: &str, raw: &str) -> Result<T, MembershipError> {
    raw.trim()
        .parse()
        .map_err(|_| MembershipError::validation(field, format!("'{}' is not a valid id", raw)))
}
