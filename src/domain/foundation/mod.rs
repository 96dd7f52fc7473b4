//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, the timestamp value object, the state machine
//! trait and error types used across the gym domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AccountId, PaymentId, PlanId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
