//! Gymdesk - Gym membership backend
//!
//! Subscription plans, gateway-backed payments reconciled into per-account
//! membership periods, a periodic expiry sweep and daily attendance.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
