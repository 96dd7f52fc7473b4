//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Unreadable .env file: {0}")]
    DotEnv(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool needs max_connections > 0 and min_connections <= max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid Flutterwave secret key format")]
    InvalidGatewayKey,

    #[error("Payment gateway base URL must be http(s)")]
    InvalidGatewayUrl,

    #[error("Currency must be a three-letter ISO code")]
    InvalidCurrency,

    #[error("Webhook secret is required in production")]
    WebhookSecretRequired,

    #[error("Invalid Resend API key format")]
    InvalidResendKey,

    #[error("Invalid email address: {0}")]
    InvalidEmail(&'static str),

    #[error("Sweep interval must be between one minute and one year")]
    InvalidSweepInterval,

    #[error("Pending payment TTL must be between one second and one year")]
    InvalidPendingTtl,
}
