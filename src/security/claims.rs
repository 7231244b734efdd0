//! Best-effort bearer token claims.
//!
//! # Responsibilities
//! - Pull the payload segment out of an `Authorization` header value
//! - Decode it (base64url, JSON) into a claims map
//!
//! # Design Decisions
//! - No signature verification: claims are advisory metadata for local runs
//! - The whole header value is split on `.`, so a `Bearer ` prefix lands in
//!   the header segment and needs no special casing
//! - Absent or empty header yields empty claims, as does a payload that is
//!   JSON-falsy (`null`, `false`, `0`, `""`)
//! - A present but malformed token is an error for the caller to surface

use base64::{engine::general_purpose, Engine as _};
use serde_json::{Map, Value};
use thiserror::Error;

/// Decoded, unverified token claims.
pub type Claims = Map<String, Value>;

/// Reasons a present `Authorization` value could not be read as a token.
#[derive(Debug, Error)]
pub enum ClaimsDecodeError {
    #[error("Invalid token specified: missing payload segment")]
    MissingPayload,

    #[error("Invalid token specified: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid token specified: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid token specified: payload is not a JSON object")]
    NotAnObject,
}

/// Decode the claims carried by `authorization`, if any.
pub fn extract_claims(authorization: Option<&str>) -> Result<Claims, ClaimsDecodeError> {
    let header = match authorization {
        Some(h) if !h.is_empty() => h,
        _ => return Ok(Claims::new()),
    };

    let payload = header
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(ClaimsDecodeError::MissingPayload)?;

    // Accept both base64 alphabets, padded or not.
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    let bytes = general_purpose::URL_SAFE_NO_PAD.decode(normalized)?;

    let payload: Value = serde_json::from_slice(&bytes)?;
    match payload {
        Value::Object(claims) => Ok(claims),
        Value::Null | Value::Bool(false) => Ok(Claims::new()),
        Value::Number(n) if n.as_f64() == Some(0.0) => Ok(Claims::new()),
        Value::String(s) if s.is_empty() => Ok(Claims::new()),
        _ => Err(ClaimsDecodeError::NotAnObject),
    }
}
