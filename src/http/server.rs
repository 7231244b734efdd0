//! HTTP server setup and the per-request dispatch loop.
//!
//! # Responsibilities
//! - Create the Axum Router with one catch-all handler
//! - Wire up middleware (tracing, CORS, body limit)
//! - Bind server to listener with graceful shutdown
//! - Per request: parse → build event → log → dispatch → translate → respond
//!
//! # Design Decisions
//! - Route table compiled once here and shared read-only through Arc
//! - Every per-request failure ends as a 500 `{message}`; nothing escapes
//!   to the connection task
//! - A panicking handler drops its context, which reads as an abandoned dispatch

use std::error::Error as StdError;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::any,
    Router,
};
use http_body_util::LengthLimitError;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowHeaders, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::app::{DispatchContext, ProxyApp};
use crate::config::AdapterConfig;
use crate::http::request::{build_event, parse_body, RawRequest, RequestEvent};
use crate::http::response::{translate, DispatchError, TranslatedResponse};
use crate::observability::logging;
use crate::routing::{RouteError, RouteTable};

/// Response header carrying the event's request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub app: Arc<dyn ProxyApp>,
    pub routes: Arc<RouteTable>,
    pub dispatch_timeout: Option<Duration>,
}

impl AppState {
    /// Compile the app's routes. A bad route map is fatal.
    pub fn new(app: Arc<dyn ProxyApp>, dispatch_timeout: Option<Duration>) -> Result<Self, RouteError> {
        let routes = RouteTable::compile(&app.api_config().routes)?;
        tracing::info!(routes = routes.len(), "Routes compiled");
        Ok(Self {
            app,
            routes: Arc::new(routes),
            dispatch_timeout,
        })
    }
}

/// HTTP server fronting a `ProxyApp`.
pub struct HttpServer {
    router: Router,
    config: AdapterConfig,
}

impl HttpServer {
    /// Create a new HTTP server for `app` with the given configuration.
    pub fn new(config: AdapterConfig, app: Arc<dyn ProxyApp>) -> Result<Self, RouteError> {
        let state = AppState::new(app, config.timeouts.dispatch_timeout())?;
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AdapterConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/", any(dispatch_handler))
            .route("/{*path}", any(dispatch_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.http.max_body_bytes));

        let router = if config.http.cors_enabled {
            router.layer(cors_layer())
        } else {
            router
        };

        router.layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Server listening on {}", addr.port());

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }
}

/// Permissive CORS: any origin, the usual methods, whatever headers were asked for.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
}

/// Catch-all handler for every method and path.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read request body");
            return reject(read_failure_status(&e), e.to_string(), &request_id);
        }
    };
    let body = match parse_body(&parts.headers, &bytes) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejected request body");
            return reject(StatusCode::BAD_REQUEST, e.to_string(), &request_id);
        }
    };

    let raw = RawRequest::from_parts(&parts, body, request_id.clone());
    let mut response = dispatch(&state, raw).await.into_response();
    set_request_id(&mut response, &request_id);
    response
}

/// Build the event, hand it to the app and translate whatever comes back.
pub async fn dispatch(state: &AppState, raw: RawRequest) -> TranslatedResponse {
    let outcome = match build_event(raw, &state.routes) {
        Ok(event) => {
            logging::log_request(&event);
            let (context, completion) = DispatchContext::channel();
            invoke(state.app.as_ref(), event, context);
            completion.wait(state.dispatch_timeout).await
        }
        Err(err) => Err(DispatchError::Claims(err)),
    };
    translate(outcome)
}

fn invoke(app: &dyn ProxyApp, event: RequestEvent, context: DispatchContext) {
    let request_id = event.request_context.request_id.clone();
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| app.proxy_router(event, context)));
    if result.is_err() {
        tracing::error!(request_id = %request_id, "Handler panicked during dispatch");
    }
}

/// 413 when the body limit cut the read short, 400 for any other read failure.
fn read_failure_status(err: &(dyn StdError + 'static)) -> StatusCode {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return StatusCode::PAYLOAD_TOO_LARGE;
        }
        current = e.source();
    }
    StatusCode::BAD_REQUEST
}

fn reject(status: StatusCode, message: String, request_id: &str) -> Response {
    let mut response = (status, Json(json!({ "message": message }))).into_response();
    set_request_id(&mut response, request_id);
    response
}

fn set_request_id(response: &mut Response, request_id: &str) {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use http_body_util::Limited;

    #[tokio::test]
    async fn test_limit_error_is_payload_too_large() {
        let body = Body::new(Limited::new(Body::from("0123456789"), 4));
        let err = axum::body::to_bytes(body, usize::MAX).await.unwrap_err();
        assert_eq!(read_failure_status(&err), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_broken_body_is_bad_request() {
        let chunks = vec![
            Ok::<_, std::io::Error>(Bytes::from("a")),
            Err(std::io::Error::other("connection reset")),
        ];
        let body = Body::from_stream(futures_util::stream::iter(chunks));
        let err = axum::body::to_bytes(body, usize::MAX).await.unwrap_err();
        assert_eq!(read_failure_status(&err), StatusCode::BAD_REQUEST);
    }
}
