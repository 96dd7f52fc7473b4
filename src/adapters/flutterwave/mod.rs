//! Flutterwave payment gateway adapter.
//!
//! - `flutterwave_adapter` - Live hosted-checkout integration
//! - `mock_gateway` - Configurable test double
//! - `webhook_types` - Wire types and signature helpers

mod flutterwave_adapter;
mod mock_gateway;
pub mod webhook_types;

pub use flutterwave_adapter::{FlutterwaveConfig, FlutterwaveGateway};
pub use mock_gateway::{MethodCall, MockPaymentGateway};
pub use webhook_types::SIGNATURE_HEADER;
