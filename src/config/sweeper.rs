//! Expiry sweeper configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const MIN_SWEEP_INTERVAL_SECS: u64 = 60;
const ONE_YEAR_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct SweeperConfig {
    /// Spawn the background sweeper at startup
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between sweeps
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Age in seconds after which an unanswered pending payment is failed
    #[serde(default = "default_pending_payment_ttl")]
    pub pending_payment_ttl_secs: u64,
}

impl SweeperConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn pending_payment_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_payment_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_SWEEP_INTERVAL_SECS..=ONE_YEAR_SECS).contains(&self.interval_secs) {
            return Err(ValidationError::InvalidSweepInterval);
        }
        if !(1..=ONE_YEAR_SECS).contains(&self.pending_payment_ttl_secs) {
            return Err(ValidationError::InvalidPendingTtl);
        }
        Ok(())
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval(),
            pending_payment_ttl_secs: default_pending_payment_ttl(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_interval() -> u64 {
    24 * 60 * 60
}

fn default_pending_payment_ttl() -> u64 {
    24 * 60 * 60
}
