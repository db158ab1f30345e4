use anyhow::Context;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use calendar_server::config::{load_env_file, Config};
use calendar_server::routes::{create_routes, AppState};
use calendar_server::store::PgEventStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = load_env_file()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Some(path) = env_file {
        tracing::info!("Loaded environment from {}", path.display());
    }

    let config = Config::from_env()?;

    let store = Arc::new(
        PgEventStore::connect(&config.database_url, config.max_connections)
            .await
            .context("Failed to connect to database")?,
    );
    tracing::info!(
        max_connections = config.max_connections,
        "Database pool created"
    );

    let app: Router = create_routes(AppState::new(store.clone()), &config);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Server running at http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    store.close().await;
    tracing::info!("Database pool closed");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
