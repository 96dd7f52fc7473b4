//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamp, errors)
//! - `catalog` - Subscription plans and their durations
//! - `payment` - Payment records and their lifecycle
//! - `membership` - Accounts, membership periods and attendance

pub mod catalog;
pub mod foundation;
pub mod membership;
pub mod payment;
