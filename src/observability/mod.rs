//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http/server.rs   → logging::log_request   (one summary line per request)
//! http/response.rs → logging::log_error     (error branch only)
//! main.rs          → logging::init_logging  (subscriber, filter, format)
//! ```
//!
//! # Design Decisions
//! - Structured logging through `tracing`; JSON output for machine parsing
//! - `RUST_LOG` overrides the configured level
//! - Request ID flows into every per-request record

pub mod logging;
