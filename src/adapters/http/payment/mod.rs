//! HTTP adapter for payment endpoints.
//!
//! - `POST /api/payment` - Start a checkout
//! - `POST /api/payment/webhook` - Gateway callback
//! - `GET /api/payment` - Global payment history
//! - `GET /api/payment/:account_id` - Account payment history

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::payment_routes;
