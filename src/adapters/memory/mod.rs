//! In-memory repository adapters.
//!
//! Used by tests and by local runs without a database.

mod account_repository;
mod payment_repository;
mod plan_repository;

pub use account_repository::InMemoryAccountRepository;
pub use payment_repository::InMemoryPaymentRepository;
pub use plan_repository::InMemoryPlanRepository;
