//! Startup orchestration.
//!
//! # Responsibilities
//! - Compile the app's routes (fatal on error)
//! - Bind the listener
//! - Run the server until a shutdown signal

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::app::ProxyApp;
use crate::config::{AdapterConfig, ConfigError};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::routing::RouteError;

/// Anything that stops the adapter from serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("configuration error: {0}")]
    Routes(#[from] RouteError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Serve `app` according to `config` until SIGINT/SIGTERM.
pub async fn serve(app: Arc<dyn ProxyApp>, config: AdapterConfig) -> Result<(), StartupError> {
    let server = HttpServer::new(config, app)?;

    let address = server.config().listener.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    server.run(listener, stop).await?;
    Ok(())
}
