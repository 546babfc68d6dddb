//! Libreria web client
//!
//! Server-rendered pages backed by the Libreria API.

use std::net::SocketAddr;

use anyhow::Context;

use libreria_server::{config::AppConfig, logging, web};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("load configuration")?;

    let _log_guard = logging::init_tracing(&config.logging, "libreria_web");

    tracing::info!(
        "Starting Libreria web client v{} (API at {})",
        env!("CARGO_PKG_VERSION"),
        config.web.api_url
    );

    let addr = SocketAddr::new(
        config.web.host.parse().context("invalid web host")?,
        config.web.port,
    );

    let state = web::WebState::new(&config.web)?;
    let app = web::create_router(state);

    tracing::info!("Web client listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
