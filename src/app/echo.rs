//! Built-in handler backed by a route file.
//!
//! Answers every declared route with the event it received, which makes the
//! adapter usable on its own for checking route maps and request shapes.

use std::collections::HashMap;
use std::path::Path;

use serde_json::json;

use crate::app::{ApiConfig, DispatchContext, HandlerError, ProxyApp};
use crate::config::{load_api_config, ConfigError};
use crate::http::request::RequestEvent;
use crate::http::response::ResponseDescriptor;
use crate::routing::router::canonical_resource_path;

/// Echoes events for the routes of a loaded `ApiConfig`.
#[derive(Debug, Clone)]
pub struct EchoApp {
    config: ApiConfig,
    methods: HashMap<String, Vec<String>>,
}

impl EchoApp {
    pub fn new(config: ApiConfig) -> Self {
        // `users` and `/users` name the same resource; their methods add up.
        let mut methods: HashMap<String, Vec<String>> = HashMap::new();
        if let Some(routes) = config.routes.as_object() {
            for (path, declared) in routes {
                let entry = methods.entry(canonical_resource_path(path)).or_default();
                if let Some(declared) = declared.as_object() {
                    entry.extend(declared.keys().cloned());
                }
            }
        }

        Self { config, methods }
    }

    /// Load the route file named by `--api-module`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = load_api_config(path)?;
        tracing::info!(path = ?path, "Api module loaded");
        Ok(Self::new(config))
    }

    fn declares(&self, resource_path: &str, method: &str) -> bool {
        self.methods
            .get(resource_path)
            .is_some_and(|methods| methods.iter().any(|m| m == method))
    }
}

impl ProxyApp for EchoApp {
    fn api_config(&self) -> ApiConfig {
        self.config.clone()
    }

    fn proxy_router(&self, event: RequestEvent, context: DispatchContext) {
        let ctx = &event.request_context;
        if !self.declares(&ctx.resource_path, &ctx.http_method) {
            let message = format!("No route for {} {}", ctx.http_method, ctx.resource_path);
            context.succeed(ResponseDescriptor::new().status(404).body(json!({ "message": message })));
            return;
        }

        match serde_json::to_value(&event) {
            Ok(body) => context.succeed(ResponseDescriptor::new().body(body)),
            Err(err) => context.done(Err(HandlerError::from_error(&err))),
        }
    }
}
