//! Membership handlers.
//!
//! Command and query handlers for the billing side of a membership:
//!
//! ## Commands
//! - Initiating a plan payment through the gateway
//! - Reconciling gateway callbacks with the membership ledger
//! - Sweeping lapsed periods and stale pending payments
//!
//! ## Queries
//! - Payment history per account or across all accounts

mod get_payment_history;
mod handle_payment_callback;
mod initiate_payment;
mod sweep_expired_memberships;

// Commands
pub use handle_payment_callback::{
    HandlePaymentCallbackCommand, HandlePaymentCallbackHandler, HandlePaymentCallbackResult,
};
pub use initiate_payment::{InitiatePaymentCommand, InitiatePaymentHandler, InitiatePaymentResult};
pub use sweep_expired_memberships::{
    SweepExpiredMembershipsHandler, SweepReport, DEFAULT_PENDING_PAYMENT_TTL,
};

// Queries
pub use get_payment_history::{
    AccountSummary, GetPaymentHistoryHandler, GetPaymentHistoryQuery, PaymentHistoryEntry, PlanSummary,
    UNKNOWN_SUBSCRIPTION_STATUS,
};
