//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `AccountRepository` - Accounts with embedded membership periods and attendance
//! - `PlanRepository` - Subscription catalog
//! - `PaymentRepository` - Payment ledger with conditional settlement
//!
//! ## External Service Ports
//!
//! - `PaymentGateway` - Hosted checkout and webhook parsing
//! - `Notifier` - Outbound member and operator notifications

mod account_repository;
mod notifier;
mod payment_gateway;
mod payment_repository;
mod plan_repository;

pub use account_repository::AccountRepository;
pub use notifier::{notify_quietly, NotificationKind, NotificationTarget, Notifier, NotifyError};
pub use payment_gateway::{
    CallbackEvent, CustomerDetails, GatewayError, GatewayErrorCode, PaymentGateway, PaymentLink,
    PaymentLinkRequest, SUCCESS_STATUS,
};
pub use payment_repository::{PaymentRepository, SettleOutcome};
pub use plan_repository::PlanRepository;
