//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod attendance;
pub mod catalog;
pub mod membership;
