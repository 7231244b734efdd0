//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → CLI flag overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → AdapterConfig (validated, immutable)
//!
//! api module file (JSON apiConfig output)
//!     → loader.rs
//!     → ApiConfig (route map handed to the route compiler)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so the adapter runs with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_api_config, load_config, ConfigError};
pub use schema::{AdapterConfig, HttpConfig, ListenerConfig, LogFormat, ObservabilityConfig, TimeoutConfig};
