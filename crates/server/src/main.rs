//! Social server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use social_api::AppState;
use social_common::Config;
use social_core::sender_from_config;
use tokio::signal;
use tracing::info;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    social_server::init_tracing(&config.logging, "social=debug,tower_http=debug");

    info!(env = %config.server.env, "Starting social server...");

    let db = social_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    social_db::migrate(&db).await?;
    info!("Migrations completed");

    let mailer = sender_from_config(&config.mail)?;
    info!(provider = ?config.mail.provider, "Mail sender ready");

    let state = AppState::new(Arc::new(db), mailer, &config);
    let app = social_server::app(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, api_url = %config.server.api_url, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
