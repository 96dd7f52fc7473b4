//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - Repositories backed by PostgreSQL
//! - `memory` - In-memory repositories for tests and local runs
//! - `flutterwave` - Hosted checkout and webhook verification
//! - `notification` - Email (Resend) and log-only notifiers
//! - `background` - Periodic expiry sweeper
//! - `http` - REST API

pub mod background;
pub mod flutterwave;
pub mod http;
pub mod memory;
pub mod notification;
pub mod postgres;

pub use background::{ExpirySweeper, ExpirySweeperConfig};
