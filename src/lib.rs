//! Local gateway adapter for serverless-style API handlers.
//!
//! Compiles a handler's route map, turns each HTTP request into a proxy
//! event, dispatches it to the handler and writes back whatever the handler
//! completes with.

pub mod app;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use app::{ApiConfig, DispatchContext, HandlerError, ProxyApp};
pub use config::AdapterConfig;
pub use http::{HttpServer, RequestEvent, ResponseDescriptor};
pub use lifecycle::Shutdown;
