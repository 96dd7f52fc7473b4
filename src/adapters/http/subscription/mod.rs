//! HTTP adapter for the subscription catalog.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::subscription_routes;
