//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Authorization header
//!     → claims.rs (split token, base64url-decode payload, parse JSON)
//!     → requestContext.authorizer.claims
//! ```
//!
//! # Design Decisions
//! - Claims are decoded, never verified: local runs need no key material
//! - Nothing here rejects a request on its own; callers decide

pub mod claims;

pub use claims::{extract_claims, Claims, ClaimsDecodeError};
