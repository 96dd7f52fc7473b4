//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresAccountRepository` - Accounts with JSONB periods and attendance
//! - `PostgresPlanRepository` - Subscription catalog
//! - `PostgresPaymentRepository` - Payment ledger with conditional settlement
//!
//! `connect` and `run_migrations` set up the pool at startup.

mod account_repository;
mod payment_repository;
mod plan_repository;

pub use account_repository::PostgresAccountRepository;
pub use payment_repository::PostgresPaymentRepository;
pub use plan_repository::PostgresPlanRepository;

use sqlx::postgres::PgPool;

use crate::config::DatabaseConfig;
use crate::domain::foundation::DomainError;

fn db_error(operation: &str, err: sqlx::Error) -> DomainError {
    tracing::error!(operation, error = %err, "Database operation failed");
    DomainError::database(format!("Failed to {}: {}", operation, err))
}

/// Open a connection pool sized from configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!(
        url = %config.redacted_url(),
        max_connections = config.max_connections,
        "Connecting to PostgreSQL"
    );

    let pool = config.pool_options().connect(&config.url).await?;

    tracing::info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Apply the embedded migrations in `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations complete");
    Ok(())
}
