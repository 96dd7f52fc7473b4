//! Gymdesk server entry point.
//!
//! Loads configuration, wires adapters into the application handlers,
//! spawns the expiry sweeper and serves the REST API until Ctrl+C/SIGTERM.

use std::error::Error;
use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use gymdesk::adapters::background::{ExpirySweeper, ExpirySweeperConfig};
use gymdesk::adapters::flutterwave::{FlutterwaveConfig, FlutterwaveGateway, MockPaymentGateway};
use gymdesk::adapters::http::{app_router, AppState};
use gymdesk::adapters::memory::{InMemoryAccountRepository, InMemoryPaymentRepository, InMemoryPlanRepository};
use gymdesk::adapters::notification::{LogNotifier, ResendNotifier};
use gymdesk::adapters::postgres::{
    self, PostgresAccountRepository, PostgresPaymentRepository, PostgresPlanRepository,
};
use gymdesk::application::handlers::membership::SweepExpiredMembershipsHandler;
use gymdesk::config::{AppConfig, DatabaseConfig, EmailConfig, PaymentConfig};
use gymdesk::ports::{AccountRepository, Notifier, PaymentGateway, PaymentRepository, PlanRepository};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        tracing::error!(error = %error, "Gymdesk exited with error");
        eprintln!("gymdesk: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        database = config.database.is_configured(),
        payment_gateway = config.payment.is_configured(),
        email = config.email.is_configured(),
        "Configuration loaded"
    );

    let (accounts, plans, payments) = repositories(&config.database).await?;
    let gateway = payment_gateway(&config.payment);
    let notifier = notifier(&config.email);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper_task = if config.sweeper.enabled {
        let handler = SweepExpiredMembershipsHandler::new(
            accounts.clone(),
            plans.clone(),
            payments.clone(),
            notifier.clone(),
        )
        .with_pending_payment_ttl(config.sweeper.pending_payment_ttl());
        let sweeper = ExpirySweeper::with_config(
            Arc::new(handler),
            ExpirySweeperConfig::default().with_interval(config.sweeper.interval()),
        );
        Some(tokio::spawn(async move { sweeper.run(shutdown_rx).await }))
    } else {
        tracing::warn!("Expiry sweeper disabled");
        None
    };

    let state = AppState::new(accounts, plans, payments, gateway, notifier);
    let app = app_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Gymdesk listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Receivers see the flag or a closed channel; either stops the loop.
    let _ = shutdown_tx.send(true);
    if let Some(task) = sweeper_task {
        if let Err(error) = task.await {
            tracing::error!(error = %error, "Expiry sweeper task panicked");
        }
    }

    tracing::info!("Gymdesk stopped");
    Ok(())
}

/// JSON logs in production, human-readable otherwise. `RUST_LOG` wins over
/// the configured level.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

type Repositories = (
    Arc<dyn AccountRepository>,
    Arc<dyn PlanRepository>,
    Arc<dyn PaymentRepository>,
);

async fn repositories(config: &DatabaseConfig) -> Result<Repositories, Box<dyn Error>> {
    if !config.is_configured() {
        tracing::warn!("No database URL configured; using in-memory storage");
        return Ok((
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(InMemoryPlanRepository::new()),
            Arc::new(InMemoryPaymentRepository::new()),
        ));
    }

    let pool = postgres::connect(config).await?;
    if config.run_migrations {
        postgres::run_migrations(&pool).await?;
    }

    Ok((
        Arc::new(PostgresAccountRepository::new(pool.clone())),
        Arc::new(PostgresPlanRepository::new(pool.clone())),
        Arc::new(PostgresPaymentRepository::new(pool)),
    ))
}

fn payment_gateway(config: &PaymentConfig) -> Arc<dyn PaymentGateway> {
    if !config.is_configured() {
        tracing::warn!("No payment gateway key configured; using the mock gateway");
        return Arc::new(MockPaymentGateway::new());
    }

    let mut gateway_config = FlutterwaveConfig::new(
        config.secret_key.expose_secret().clone(),
        config.webhook_secret.expose_secret().clone(),
    )
    .with_base_url(config.base_url.clone())
    .with_currency(config.currency.clone());
    if let Some(url) = &config.redirect_url {
        gateway_config = gateway_config.with_redirect_url(url.clone());
    }
    if config.is_test_mode() {
        tracing::info!("Flutterwave running with a test key");
    }

    Arc::new(FlutterwaveGateway::new(gateway_config))
}

fn notifier(config: &EmailConfig) -> Arc<dyn Notifier> {
    if !config.is_configured() {
        tracing::warn!("No Resend API key configured; notifications are logged only");
        return Arc::new(LogNotifier);
    }

    Arc::new(ResendNotifier::new(
        config.resend_api_key.clone(),
        config.from_header(),
        config.operator_email.clone(),
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(error = %error, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
