//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, CORS, body limit, catch-all route)
//!     → request.rs (parse body/query/headers, build proxy event)
//!     → app::ProxyApp::proxy_router (external handler)
//!     → response.rs (translate outcome, serialize)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{build_event, RawRequest, RequestEvent};
pub use response::{translate, DispatchError, ResponseDescriptor, TranslatedResponse};
pub use server::{dispatch, AppState, HttpServer, X_REQUEST_ID};
