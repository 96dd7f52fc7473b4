//! Environment-driven configuration.
//!
//! Sections map to `GYMDESK__<SECTION>__<KEY>` variables; each section
//! validates itself and `AppConfig::validate` adds the production rules.
//!
//! # Example
//!
//! ```no_run
//! use gymdesk::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod email;
mod error;
mod payment;
mod server;
mod sweeper;

pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};
pub use sweeper::SweeperConfig;

use serde::Deserialize;

/// Root configuration.
///
/// Every section has defaults, so an empty environment yields a development
/// setup with in-memory storage, the mock gateway and log-only notifications.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub payment: PaymentConfig,
    pub email: EmailConfig,
    pub sweeper: SweeperConfig,
}

impl AppConfig {
    /// Reads `.env` (if present) and then `GYMDESK__<SECTION>__<KEY>`
    /// variables, e.g. `GYMDESK__SWEEPER__INTERVAL_SECS=3600`.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(ConfigError::DotEnv(err.to_string()));
            }
        }

        let source = config::Environment::with_prefix("GYMDESK")
            .prefix_separator("__")
            .separator("__");

        Ok(config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?)
    }

    /// Production additionally requires a database, a gateway key and a
    /// webhook secret.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let production = self.is_production();
        self.server.validate()?;
        self.database.validate(production)?;
        self.payment.validate(production)?;
        self.email.validate()?;
        self.sweeper.validate()
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
