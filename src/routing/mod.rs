//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route compilation (at startup):
//!     ApiConfig.routes (ordered map: template → { METHOD → descriptor })
//!     → router.rs (one RouteDescriptor per template, registration order)
//!     → matcher.rs (compile `{name}` placeholders into a PathPattern)
//!     → Freeze as immutable RouteTable
//!
//! Incoming request (method, pathname)
//!     → router.rs (ordered scan, method AND pattern must agree)
//!     → Return: matched resource path + path parameters, or raw-path fallback
//! ```
//!
//! # Design Decisions
//! - Routes compiled once at startup, immutable at runtime
//! - First match wins; no specificity ranking
//! - Method mismatch keeps scanning instead of answering 405
//! - Matching is total: an unmatched path is a result, not an error

pub mod matcher;
pub mod router;

pub use matcher::PathPattern;
pub use router::{MatchResult, RouteDescriptor, RouteError, RouteTable};
