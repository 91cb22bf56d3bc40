//! Atopix Web Server
//!
//! Run with: cargo run -p atopix-web

use atopix_config::AppConfig;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Atopix Web Server...");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = atopix_web::state::AppState::new(config);
    info!(models = ?state.models.names(), "prediction models loaded");
    info!(origins = ?state.config.server.cors_origins, "CORS enabled");
    info!(
        baseline = %state.config.data.baseline_path.display(),
        cache_ttl_secs = state.config.cache.ttl_secs,
        "data settings"
    );

    let app = atopix_web::router::build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("🚀 Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
