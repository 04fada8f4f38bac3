//! # Labelgate API Server
//!
//! Account service for Labelgate: registration, login and password reset.
//!
//! ## Architecture
//!
//! The API server is built with Axum and provides:
//! - Registration that completes pre-created placeholder accounts
//! - Login by username, e-mail or either, per `ACCOUNT_AUTHENTICATION_METHOD`
//! - Password reset e-mails linking to the configured UI host
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p labelgate-api
//! ```

use labelgate_api::{
    app::{build_router, AppState},
    config::Config,
};
use labelgate_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    mail::LogMailer,
    store::PgUserStore,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "labelgate_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Labelgate API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    tracing::info!(
        authentication_method = %config.account.authentication_method,
        unique_email = config.account.unique_email,
        "Account settings loaded"
    );

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    run_migrations(&pool).await?;

    let bind_address = config.bind_address();
    let state = AppState::new(
        Arc::new(PgUserStore::new(pool.clone())),
        Arc::new(LogMailer),
        config,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received, exiting...");
        })
        .await?;

    close_pool(pool).await;
    Ok(())
}
