//! ExpirySweeper - Background service running the membership expiry sweep.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 24h | Time between sweeps |
//! | `run_on_start` | true | Sweep immediately instead of waiting one interval |
//!
//! ## Graceful Shutdown
//!
//! The service listens on a `watch` channel. A sweep in progress finishes
//! before the loop exits; no final sweep is run.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::application::handlers::membership::{SweepExpiredMembershipsHandler, SweepReport};
use crate::domain::foundation::Timestamp;
use crate::domain::membership::MembershipError;

/// Configuration for the ExpirySweeper service.
#[derive(Debug, Clone)]
pub struct ExpirySweeperConfig {
    pub interval: Duration,
    pub run_on_start: bool,
}

impl Default for ExpirySweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            run_on_start: true,
        }
    }
}

impl ExpirySweeperConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_run_on_start(mut self, run_on_start: bool) -> Self {
        self.run_on_start = run_on_start;
        self
    }
}

/// Runs [`SweepExpiredMembershipsHandler::sweep`] on a fixed interval.
pub struct ExpirySweeper {
    handler: Arc<SweepExpiredMembershipsHandler>,
    config: ExpirySweeperConfig,
}

impl ExpirySweeper {
    pub fn new(handler: Arc<SweepExpiredMembershipsHandler>) -> Self {
        Self::with_config(handler, ExpirySweeperConfig::default())
    }

    pub fn with_config(handler: Arc<SweepExpiredMembershipsHandler>, config: ExpirySweeperConfig) -> Self {
        Self { handler, config }
    }

    /// Run the sweep loop until the shutdown signal flips to `true`.
    ///
    /// A failed sweep is logged and retried at the next tick.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !self.config.run_on_start {
            // The first tick of a tokio interval completes immediately
            interval.tick().await;
        }

        tracing::info!(interval_secs = self.config.interval.as_secs(), "Expiry sweeper started");
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Expiry sweeper stopping");
                        return;
                    }
                }

                _ = interval.tick() => {
                    if let Err(err) = self.run_once().await {
                        tracing::error!(error = %err, "Expiry sweep failed");
                    }
                }
            }
        }
    }

    /// Run exactly one sweep as of now.
    pub async fn run_once(&self) -> Result<SweepReport, MembershipError> {
        self.handler.sweep(Timestamp::now()).await
    }
}
