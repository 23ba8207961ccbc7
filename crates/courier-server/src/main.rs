//! Gateway binary for Courier live tracking.
//!
//! Loads configuration, initializes structured logging, and serves the
//! `WebSocket` gateway until `Ctrl-C` or `SIGTERM`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `courier-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build shared state from the delivery limits
//! 4. Bind and serve the gateway
//! 5. On a termination signal, close every subscription and exit

mod error;

use std::path::Path;
use std::sync::Arc;

use courier_core::config::{LogFormat, LoggingConfig};
use courier_core::CourierConfig;
use courier_gateway::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::ServerBinError;

/// Config file looked up in the working directory.
const CONFIG_PATH: &str = "courier-config.yaml";

/// Application entry point for the gateway.
///
/// # Errors
///
/// Returns an error if configuration, logging, or the listener cannot be
/// set up, or if the server task fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging)?;
    info!(
        host = config.server.host,
        port = config.server.port,
        outbound_capacity = config.delivery.outbound_capacity,
        send_timeout_ms = config.delivery.send_timeout_ms,
        "courier-server starting"
    );

    // 3. Shared state.
    let state = Arc::new(AppState::new(config.delivery.clone()));

    // 4. Serve.
    let gateway =
        courier_gateway::spawn_gateway(&config.server, Arc::clone(&state), shutdown_signal())
            .await
            .map_err(ServerBinError::from)?;
    info!(addr = %gateway.addr, "Gateway ready");

    gateway.handle.await.map_err(|e| ServerBinError::Join {
        message: format!("{e}"),
    })?;

    info!(
        rooms = state.registry.room_count(),
        connections = state.registry.connection_count(),
        "courier-server shutdown complete"
    );
    Ok(())
}

/// Load configuration from [`CONFIG_PATH`], or defaults when absent.
///
/// Environment overrides apply in both cases.
fn load_config() -> Result<CourierConfig, ServerBinError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(CourierConfig::from_file(config_path)?)
    } else {
        Ok(CourierConfig::parse("")?)
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `logging.level` when set.
fn init_tracing(logging: &LoggingConfig) -> Result<(), ServerBinError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level).map_err(|e| ServerBinError::LogFilter {
            directive: logging.level.clone(),
            message: format!("{e}"),
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

/// Resolve on `Ctrl-C` or, on Unix, `SIGTERM`.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        () = ctrl_c => info!("Received Ctrl-C"),
        () = terminate => info!("Received SIGTERM"),
    }
}
