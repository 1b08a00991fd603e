//! amd-service - main entry point
//!
//! Startup order: arguments, configuration, tracing, engine load, then the
//! HTTP listener. The engine is loaded before the port is bound so the first
//! request already sees the final engine state.

use amd_common::config::{ConfigSource, TomlConfig};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

use amd_service::cli::Args;
use amd_service::service::PredictionService;
use amd_service::{build_router, AppState, BUILD_PROFILE, BUILD_TIMESTAMP, GIT_HASH};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, source) =
        TomlConfig::resolve(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    amd_common::logging::init_tracing(&config.logging)?;

    info!(
        "Starting amd-service v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        GIT_HASH,
        BUILD_TIMESTAMP,
        BUILD_PROFILE
    );
    match &source {
        ConfigSource::File(_) => info!("Configuration: {}", source),
        ConfigSource::Defaults => warn!("No configuration file found, using {}", source),
    }

    let service = PredictionService::from_config(&config)?;
    let health = service.health();
    info!(
        "Model loaded: {} (device: {})",
        health.model_loaded, health.device
    );

    let app = build_router(AppState::new(service), config.server.max_upload_bytes);

    let host = config.server.host.as_str();
    let port = config.server.port;
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", host, port))?;
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
