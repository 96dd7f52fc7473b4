//! Membership-specific error types.
//!
//! Errors raised by the payment reconciliation workflow, the subscription
//! catalog and attendance tracking.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | ValidationFailed | 400 |
//! | PaymentRejected | 402 |
//! | InvalidWebhookSignature | 401 |
//! | InvalidState | 409 |
//! | GatewayError | 502 |
//! | Inconsistency | 500 |
//! | Infrastructure | 500 |

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::foundation::{
    AccountId, DomainError, ErrorCode, PaymentId, PlanId, ValidationError,
};

/// Errors from the membership and billing workflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipError {
    /// Account, plan or payment record is absent.
    NotFound { entity: &'static str, id: String },

    /// Payment provider unreachable or answered with garbage.
    GatewayError { message: String, retryable: bool },

    /// Gateway reported a non-success status for the payment.
    PaymentRejected { payment_id: PaymentId, reason: String },

    /// Membership was granted but the payment record could not be settled.
    Inconsistency { payment_id: PaymentId, reason: String },

    /// Operation not allowed in the current state.
    InvalidState { current: String, attempted: String },

    InvalidWebhookSignature,

    ValidationFailed { field: String, message: String },

    /// Storage or other internal failure.
    Infrastructure(String),
}

impl MembershipError {
    pub fn account_not_found(id: AccountId) -> Self {
        MembershipError::NotFound {
            entity: "account",
            id: id.to_string(),
        }
    }

    pub fn plan_not_found(id: PlanId) -> Self {
        MembershipError::NotFound {
            entity: "plan",
            id: id.to_string(),
        }
    }

    pub fn payment_not_found(reference: impl Into<String>) -> Self {
        MembershipError::NotFound {
            entity: "payment",
            id: reference.into(),
        }
    }

    pub fn gateway(message: impl Into<String>, retryable: bool) -> Self {
        MembershipError::GatewayError {
            message: message.into(),
            retryable,
        }
    }

    pub fn payment_rejected(payment_id: PaymentId, reason: impl Into<String>) -> Self {
        MembershipError::PaymentRejected {
            payment_id,
            reason: reason.into(),
        }
    }

    pub fn inconsistency(payment_id: PaymentId, reason: impl Into<String>) -> Self {
        MembershipError::Inconsistency {
            payment_id,
            reason: reason.into(),
        }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        MembershipError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn invalid_webhook_signature() -> Self {
        MembershipError::InvalidWebhookSignature
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        MembershipError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        MembershipError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            MembershipError::NotFound { entity, .. } => match *entity {
                "account" => ErrorCode::AccountNotFound,
                "plan" => ErrorCode::PlanNotFound,
                _ => ErrorCode::PaymentNotFound,
            },
            MembershipError::GatewayError { .. } => ErrorCode::GatewayError,
            MembershipError::PaymentRejected { .. } => ErrorCode::PaymentRejected,
            MembershipError::Inconsistency { .. } => ErrorCode::Inconsistency,
            MembershipError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            MembershipError::InvalidWebhookSignature => ErrorCode::InvalidWebhookSignature,
            MembershipError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            MembershipError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            MembershipError::NotFound { entity, id } => format!("{} not found: {}", capitalize(entity), id),
            MembershipError::GatewayError { message, .. } => {
                format!("Payment gateway error: {}", message)
            }
            MembershipError::PaymentRejected { payment_id, reason } => {
                format!("Payment {} was not successful: {}", payment_id, reason)
            }
            MembershipError::Inconsistency { payment_id, reason } => {
                format!("Payment {} is inconsistent with membership: {}", payment_id, reason)
            }
            MembershipError::InvalidState { current, attempted } => {
                format!("Cannot {} while {}", attempted, current)
            }
            MembershipError::InvalidWebhookSignature => "Invalid webhook signature".to_string(),
            MembershipError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            MembershipError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if the caller (or the gateway) should try again.
    pub fn is_retryable(&self) -> bool {
        match self {
            MembershipError::Infrastructure(_) | MembershipError::Inconsistency { .. } => true,
            MembershipError::GatewayError { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl std::fmt::Display for MembershipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for MembershipError {}

impl From<DomainError> for MembershipError {
    fn from(err: DomainError) -> Self {
        let id = err.details.get("id").cloned().unwrap_or_default();
        match err.code {
            ErrorCode::AccountNotFound => MembershipError::NotFound { entity: "account", id },
            ErrorCode::PlanNotFound => MembershipError::NotFound { entity: "plan", id },
            ErrorCode::PaymentNotFound => MembershipError::NotFound { entity: "payment", id },
            ErrorCode::InvalidStateTransition => MembershipError::InvalidState {
                current: err.details.get("current").cloned().unwrap_or_else(|| "unknown".to_string()),
                attempted: err.message,
            },
            ErrorCode::ValidationFailed => MembershipError::ValidationFailed {
                field: err.details.get("field").cloned().unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => MembershipError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for MembershipError {
    fn from(err: ValidationError) -> Self {
        MembershipError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// Errors raised while recording gym attendance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttendanceError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Account has no active membership")]
    NoActiveMembership,

    #[error("Already clocked in on {0}")]
    AlreadyClockedIn(NaiveDate),

    #[error("No clock-in recorded on {0}")]
    NotClockedIn(NaiveDate),

    #[error("Already clocked out on {0}")]
    AlreadyClockedOut(NaiveDate),

    #[error("start_date {from} is after end_date {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    #[error("Error: {0}")]
    Infrastructure(String),
}

impl AttendanceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AttendanceError::AccountNotFound(_) => ErrorCode::AccountNotFound,
            AttendanceError::NoActiveMembership => ErrorCode::NoActiveMembership,
            AttendanceError::AlreadyClockedIn(_) => ErrorCode::AlreadyClockedIn,
            AttendanceError::NotClockedIn(_) => ErrorCode::NotClockedIn,
            AttendanceError::AlreadyClockedOut(_) => ErrorCode::AlreadyClockedOut,
            AttendanceError::InvalidRange { .. } => ErrorCode::ValidationFailed,
            AttendanceError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<DomainError> for AttendanceError {
    fn from(err: DomainError) -> Self {
        AttendanceError::Infrastructure(err.to_string())
    }
}
