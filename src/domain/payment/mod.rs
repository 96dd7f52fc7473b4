//! Payment domain module.
//!
//! - `record` - PaymentRecord ledger entry and gateway metadata
//! - `status` - PaymentStatus state machine

mod record;
mod status;

pub use record::{GatewayMetadata, PaymentRecord};
pub use status::PaymentStatus;
