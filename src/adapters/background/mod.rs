//! Background services spawned next to the HTTP server.

mod expiry_sweeper;

pub use expiry_sweeper::{ExpirySweeper, ExpirySweeperConfig};
