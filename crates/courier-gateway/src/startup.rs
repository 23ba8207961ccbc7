//! Gateway startup helper.
//!
//! Provides [`spawn_gateway`] which binds the listener eagerly and then
//! runs the gateway on a background Tokio task, so bind failures surface
//! to the caller before anything is spawned.
//!
//! # Usage
//!
//! ```rust,ignore
//! use courier_gateway::startup::spawn_gateway;
//! use courier_gateway::state::AppState;
//! use std::sync::Arc;
//!
//! let state = Arc::new(AppState::default());
//! let gateway = spawn_gateway(&config.server, state, shutdown_signal()).await?;
//! gateway.handle.await?;
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use courier_core::config::ServerSection;
use tokio::task::JoinHandle;

use crate::server::{self, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the gateway.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A gateway running on a background task.
#[derive(Debug)]
pub struct RunningGateway {
    /// The address actually bound (resolves port 0).
    pub addr: SocketAddr,
    /// Completes when the server has shut down.
    pub handle: JoinHandle<()>,
}

/// Bind the configured address and serve the gateway in the background.
///
/// The server runs until `shutdown` resolves, at which point every open
/// subscription is closed and the task finishes.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the listener cannot be bound.
pub async fn spawn_gateway<F>(
    config: &ServerSection,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<RunningGateway, StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = server::bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("listener has no local address: {e}")))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state, shutdown).await {
            tracing::error!(error = %e, "Gateway server exited with error");
        }
    });

    tracing::info!(%addr, "Gateway server spawned on background task");

    Ok(RunningGateway { addr, handle })
}
