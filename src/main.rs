use std::sync::Arc;

use anyhow::Context;
use pages_api::auth::JwtSessionResolver;
use pages_api::config;
use pages_api::database::{DatabaseManager, PgRecordStore};
use pages_api::pages::PageSettings;
use pages_api::server::{self, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pages_api=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting pages API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; every page request will be rejected as unauthenticated");
    }

    let database_url = DatabaseManager::database_url()?;
    let pool = DatabaseManager::connect(&database_url, &config.database)?;

    let state = AppState::new(
        Arc::new(JwtSessionResolver::new(config.security.jwt_secret.clone())),
        Arc::new(PgRecordStore::new(pool.clone())),
        PageSettings::from_config(config),
        config.security.session_cookie.clone(),
    );
    let app = server::app(state, config);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Pages API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.close().await;
    tracing::info!("Pages API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        // Keep serving if the handler cannot be installed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
