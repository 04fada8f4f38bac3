//! Application state and router builder
//!
//! This module defines the shared application state and provides
//! a function to build the Axum router with all routes and middleware.
//!
//! # Example
//!
//! ```no_run
//! use labelgate_api::{app::{build_router, AppState}, config::Config};
//! use labelgate_shared::{mail::LogMailer, store::PgUserStore};
//! use sqlx::PgPool;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = PgPool::connect(&config.database.url).await?;
//! let state = AppState::new(Arc::new(PgUserStore::new(pool)), Arc::new(LogMailer), config);
//! let app = build_router(state);
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use labelgate_shared::{
    account::{
        AccountAdapter, AccountSettings, DefaultAccountAdapter, Login, PasswordReset, Registration,
    },
    auth::tokens::{JwtTokenGenerator, TokenGenerator},
    mail::Mailer,
    store::UserStore,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// User persistence
    pub store: Arc<dyn UserStore>,

    /// Outbound account e-mail
    pub mailer: Arc<dyn Mailer>,

    /// Overridable account behaviour
    pub adapter: Arc<dyn AccountAdapter>,

    /// Password-reset token generator
    pub tokens: Arc<dyn TokenGenerator>,

    /// Account settings derived from `config.account`
    pub settings: Arc<AccountSettings>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state with the default account adapter
    pub fn new(store: Arc<dyn UserStore>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        let settings = config.account.settings();
        let adapter = Arc::new(DefaultAccountAdapter::new(settings.password_policy.clone()));
        Self::with_adapter(store, mailer, adapter, config)
    }

    /// Creates new application state with a custom account adapter
    pub fn with_adapter(
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        adapter: Arc<dyn AccountAdapter>,
        config: Config,
    ) -> Self {
        Self {
            store,
            mailer,
            adapter,
            tokens: Arc::new(JwtTokenGenerator::new(config.jwt.secret.clone())),
            settings: Arc::new(config.account.settings()),
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    pub fn registration(&self) -> Registration {
        Registration::new(
            self.store.clone(),
            self.adapter.clone(),
            self.settings.clone(),
        )
    }

    pub fn login(&self) -> Login {
        Login::new(self.store.clone(), self.settings.clone())
    }

    pub fn password_reset(&self) -> PasswordReset {
        PasswordReset::new(
            self.store.clone(),
            self.mailer.clone(),
            self.tokens.clone(),
            self.adapter.clone(),
            self.settings.clone(),
        )
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                    # Health check (public)
/// └── /v1/auth/
///     ├── POST /register
///     ├── POST /login
///     └── POST /password/reset
/// ```
///
/// # Middleware Stack
///
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/password/reset", post(routes::auth::password_reset));

    let v1_routes = Router::new().nest("/auth", auth_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
