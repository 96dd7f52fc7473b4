//! HTTP adapter for the attendance register.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::attendance_routes;
