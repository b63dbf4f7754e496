use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemMediaStore;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use casting_server::config::AppConfig;
use casting_server::services::notifier::LogNotifier;
use casting_server::services::payment::RazorpayGateway;
use casting_server::state::AppState;
use casting_server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    if config.auth.jwt_secret.len() < 32 {
        anyhow::bail!("auth.jwt_secret must be at least 32 characters");
    }

    info!("Connecting to database...");
    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    seed::run(&db, &config.bootstrap)
        .await
        .context("Failed to seed database")?;

    let media = FilesystemMediaStore::new(
        PathBuf::from(&config.storage.public_dir),
        &config.storage.public_url,
    )
    .await
    .context("Failed to prepare public storage")?;

    let state = AppState {
        db,
        media: Arc::new(media),
        notifier: Arc::new(LogNotifier),
        payments: Arc::new(RazorpayGateway::new(&config.payment.razorpay_api_base)),
        config: config.clone(),
    };

    let app = build_router(state);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running at http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
