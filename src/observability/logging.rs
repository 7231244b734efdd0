//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from config
//! - Emit the per-request summary record before dispatch
//! - Emit the error record on the failure branch

use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter, Layer,
};

use crate::config::{LogFormat, ObservabilityConfig};
use crate::http::request::RequestEvent;

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config.log_level.to_ascii_lowercase();
        format!("gateway_local={level},tower_http={level}").into()
    });

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
}

/// Summary of an inbound request, logged before the handler sees it.
pub fn log_request(event: &RequestEvent) {
    let query = serde_json::to_string(&event.query_string_parameters).unwrap_or_default();
    tracing::info!(
        request_id = %event.request_context.request_id,
        resource_path = %event.request_context.resource_path,
        http_method = %event.request_context.http_method,
        referer = event.headers.get("referer").map(String::as_str),
        query_string_parameters = %query,
        "Request received"
    );
}

pub fn log_error(message: &str, stack: &str) {
    tracing::error!(error = %message, stack = %stack, "Request failed");
}
