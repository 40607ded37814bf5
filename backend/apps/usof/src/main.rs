//! usof API Server Entry Point
//!
//! Loads configuration, connects the stores and serves the auth API under
//! `/api`. Startup failures surface through `anyhow` and exit with status 1.

mod config;
mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use auth::infra::{GoogleProvider, PgUserRepository, RedisSessionStore, SmtpEmailSender};
use auth::{AuthAppState, ProductionBackend, api_router};
use axum::routing::get;
use axum::{
    Router, http,
    http::{Method, header},
};
use platform::clock::SystemClock;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Mode, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;

    // Initialize tracing. RUST_LOG wins over LOG_LEVEL.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.default_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let sessions = RedisSessionStore::connect(config.redis.clone())
        .await
        .context("Failed to connect to Redis")?;

    tracing::info!("Connected to session store");

    let provider = GoogleProvider::new(config.google.clone(), config.auth.operation_timeout)
        .context("Failed to build Google client")?;
    let mailer = SmtpEmailSender::new(config.smtp.clone())
        .context("Failed to build SMTP transport")?;

    let state = AuthAppState::<ProductionBackend>::new(
        PgUserRepository::new(pool),
        sessions,
        provider,
        mailer,
        config.auth.clone(),
        Arc::new(SystemClock),
    )
    .context("Failed to initialize auth")?;

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let mut app = Router::new().nest("/api", api_router(state));
    if config.mode != Mode::Release {
        app = app.route("/ping", get(health::ping));
    }
    let app = app.layer(TraceLayer::new_for_http()).layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(mode = ?config.mode, "Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Gracefully shutting down");
}
