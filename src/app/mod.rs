//! External handler contract.
//!
//! # Data Flow
//! ```text
//! startup:  ProxyApp::api_config() → ApiConfig.routes → RouteTable::compile
//! request:  RequestEvent + DispatchContext → ProxyApp::proxy_router
//!           → handler calls DispatchContext::done(..) whenever it is ready
//!           → completion.rs delivers the outcome to the dispatch loop
//! ```
//!
//! # Design Decisions
//! - The handler is opaque: the adapter only needs the route map and the
//!   dispatch entry point
//! - `done` consumes the context, so a second completion cannot be expressed
//! - A dropped context counts as a failed dispatch, never a hang

pub mod completion;
pub mod echo;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::http::request::RequestEvent;

pub use completion::{Completion, DispatchContext, DispatchOutcome};
pub use echo::EchoApp;

/// Route-map accessor output of a handler.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ApiConfig {
    /// Handlers report this as a number or a string; it is carried, not interpreted.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub version: Value,

    /// `{ "<template>": { "<METHOD>": <opaque descriptor>, ... }, ... }`
    #[serde(default)]
    pub routes: Value,
}

/// A serverless-style handler driven by the adapter.
pub trait ProxyApp: Send + Sync + 'static {
    /// The handler's declared routes. Called once at startup.
    fn api_config(&self) -> ApiConfig;

    /// Handle one event. The handler must eventually complete `context`,
    /// either before returning or later from another task.
    fn proxy_router(&self, event: RequestEvent, context: DispatchContext);
}

/// Error reported by a handler through `done`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
    pub stack: Option<String>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Capture an error's message and its source chain as the stack.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut stack = format!("Error: {err}");
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push_str(&format!("\n    caused by: {cause}"));
            source = cause.source();
        }
        Self::new(err.to_string()).with_stack(stack)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}
