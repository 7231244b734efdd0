//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use gateway_local::app::{ApiConfig, DispatchContext, ProxyApp};
use gateway_local::config::AdapterConfig;
use gateway_local::http::{HttpServer, RequestEvent};
use gateway_local::lifecycle::Shutdown;
use serde_json::Value;
use tokio::net::TcpListener;

type HandlerFn = dyn Fn(RequestEvent, DispatchContext) + Send + Sync;

/// A programmable handler that counts its dispatches.
pub struct TestApp {
    routes: Value,
    handler: Box<HandlerFn>,
    calls: AtomicUsize,
}

impl TestApp {
    pub fn new<F>(routes: Value, handler: F) -> Arc<Self>
    where
        F: Fn(RequestEvent, DispatchContext) + Send + Sync + 'static,
    {
        Arc::new(Self {
            routes,
            handler: Box::new(handler),
            calls: AtomicUsize::new(0),
        })
    }

    #[allow(dead_code)]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProxyApp for TestApp {
    fn api_config(&self) -> ApiConfig {
        ApiConfig {
            version: Value::Null,
            routes: self.routes.clone(),
        }
    }

    fn proxy_router(&self, event: RequestEvent, context: DispatchContext) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.handler)(event, context);
    }
}

/// Start a server for `app` on an ephemeral port.
#[allow(dead_code)]
pub async fn start_server(app: Arc<dyn ProxyApp>, config: AdapterConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config, app).unwrap();

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, stop).await;
    });

    (addr, shutdown)
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// An unsigned token carrying `claims`.
#[allow(dead_code)]
pub fn token(claims: &Value) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.")
}
