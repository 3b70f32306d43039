//! Listener and shutdown handling for the gateway.
//!
//! [`start_server`] binds `host:port`, mounts the router, and serves until
//! `Ctrl-C`. Requests already in flight are drained before it returns.

use std::io;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::router::build_router;
use crate::state::AppState;

/// Serve the gateway described by `config` until shutdown.
///
/// # Errors
///
/// [`ServerError::Bind`] if the listener cannot be opened on the configured
/// host and port, [`ServerError::Serve`] if accepting connections fails.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|source| ServerError::Bind {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;
    let local = listener.local_addr().map_err(ServerError::Serve)?;

    info!(addr = %local, www_path = %config.www_path, "Gateway listening");

    axum::serve(listener, build_router(state, &config.www_path))
        .with_graceful_shutdown(ctrl_c())
        .await
        .map_err(ServerError::Serve)?;

    info!("Gateway stopped");
    Ok(())
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            // Without a signal handler the server runs until killed.
            error!(error = %e, "Cannot install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    }
}

/// Failures of the HTTP listener.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listening socket could not be opened.
    #[error("cannot listen on {host}:{port}: {source}")]
    Bind {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
        /// Underlying socket error.
        source: io::Error,
    },

    /// Serving stopped with an I/O error.
    #[error("serve failed: {0}")]
    Serve(#[source] io::Error),
}
