//! Local gateway for serverless-style API handlers.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                    LOCAL GATEWAY                      │
//!                      │                                                       │
//!   Client Request     │  ┌──────────┐   ┌──────────┐   ┌──────────────────┐  │
//!   ───────────────────┼─▶│   http   │──▶│ routing  │──▶│  event builder   │  │
//!                      │  │  server  │   │  table   │   │ (+ claims)       │  │
//!                      │  └──────────┘   └──────────┘   └────────┬─────────┘  │
//!                      │                                          ▼            │
//!                      │                                 ┌──────────────────┐  │
//!                      │                                 │  ProxyApp        │  │
//!                      │                                 │  proxy_router    │  │
//!                      │                                 └────────┬─────────┘  │
//!                      │                                     done │            │
//!   Client Response    │  ┌──────────┐                            ▼            │
//!   ◀──────────────────┼──│ response │◀──────────────── completion channel   │
//!                      │  │translator│                                        │
//!                      │  └──────────┘                                        │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use gateway_local::app::EchoApp;
use gateway_local::config::{self, validation::validate_config, AdapterConfig, ConfigError, LogFormat};
use gateway_local::lifecycle;
use gateway_local::observability::logging;

#[derive(Parser)]
#[command(name = "gateway-local", version)]
#[command(about = "Serve a serverless-style API handler on a local HTTP port", long_about = None)]
struct Cli {
    /// Api module: JSON file holding the handler's apiConfig output
    #[arg(short = 'a', long)]
    api_module: PathBuf,

    /// Port to listen on [default: 3000]
    #[arg(short, long)]
    port: Option<u16>,

    /// Interface to bind [default: 127.0.0.1]
    #[arg(long)]
    host: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds to wait for the handler to complete; 0 waits forever
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Log output format
    #[arg(long, value_parser = ["pretty", "json"])]
    log_format: Option<String>,
}

impl Cli {
    fn resolve_config(&self) -> Result<AdapterConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => AdapterConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(host) = &self.host {
            config.listener.host = host.clone();
        }
        if let Some(secs) = self.timeout {
            config.timeouts.dispatch_secs = secs;
        }
        match self.log_format.as_deref() {
            Some("json") => config.observability.log_format = LogFormat::Json,
            Some("pretty") => config.observability.log_format = LogFormat::Pretty,
            _ => {}
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    logging::init_logging(&config.observability)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.listener.port,
        dispatch_timeout_secs = config.timeouts.dispatch_secs,
        "gateway-local starting"
    );

    let app = EchoApp::load(&cli.api_module).map_err(lifecycle::StartupError::from)?;
    lifecycle::serve(Arc::new(app), config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
