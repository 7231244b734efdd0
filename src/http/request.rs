//! Request handling and event translation.
//!
//! # Responsibilities
//! - Parse the inbound body (JSON, urlencoded form) the way the handler expects
//! - Flatten headers and query string into string maps
//! - Build the proxy event: route match + claims + pass-through request data
//!
//! # Design Decisions
//! - Event building is pure: no I/O, no shared state beyond the route table
//! - Header names arrive lowercased from hyper; repeated headers are joined with ", "
//! - Repeated query keys: last value wins
//! - Bodies with no recognised content type become `{}`

use std::collections::BTreeMap;

use axum::http::{header, request::Parts, HeaderMap};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::routing::RouteTable;
use crate::security::claims::{extract_claims, Claims, ClaimsDecodeError};

/// The normalized event handed to a handler, shaped like a gateway proxy event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEvent {
    pub request_context: RequestContext,
    pub headers: BTreeMap<String, String>,
    pub query_string_parameters: BTreeMap<String, String>,
    pub body: Value,
    pub path_parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub resource_path: String,
    pub http_method: String,
    pub request_id: String,
    pub authorizer: Authorizer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Authorizer {
    pub claims: Claims,
}

/// A request as delivered by the HTTP layer: decoded and parsed, not yet routed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRequest {
    pub request_id: String,
    pub method: String,
    pub pathname: String,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: Value,
}

impl RawRequest {
    /// Assemble from request parts and an already-parsed body.
    pub fn from_parts(parts: &Parts, body: Value, request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            method: parts.method.as_str().to_string(),
            pathname: parts.uri.path().to_string(),
            headers: flatten_headers(&parts.headers),
            query: parse_query(parts.uri.query()),
            body,
        }
    }

    pub fn authorization(&self) -> Option<&str> {
        self.headers.get("authorization").map(String::as_str)
    }
}

/// Body parsing failures, answered with 400 before dispatch.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Build the event for `raw`. Fails only when a present bearer token is malformed.
pub fn build_event(raw: RawRequest, routes: &RouteTable) -> Result<RequestEvent, ClaimsDecodeError> {
    let matched = routes.match_request(&raw.method, &raw.pathname);
    let claims = extract_claims(raw.authorization())?;

    Ok(RequestEvent {
        request_context: RequestContext {
            resource_path: matched.resource_path,
            http_method: raw.method,
            request_id: raw.request_id,
            authorizer: Authorizer { claims },
        },
        headers: raw.headers,
        query_string_parameters: raw.query,
        body: raw.body,
        path_parameters: matched.path_parameters,
    })
}

/// Parse a body according to its `content-type`.
pub fn parse_body(headers: &HeaderMap, bytes: &[u8]) -> Result<Value, BodyError> {
    let empty = || Value::Object(Map::new());
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(empty());
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if essence == "application/json" || essence.ends_with("+json") {
        Ok(serde_json::from_slice(bytes)?)
    } else if essence == "application/x-www-form-urlencoded" {
        let form = url::form_urlencoded::parse(bytes)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
        Ok(Value::Object(form))
    } else {
        Ok(empty())
    }
}

fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    flat
}

fn parse_query(query: Option<&str>) -> BTreeMap<String, String> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};
    use base64::{engine::general_purpose, Engine as _};
    use serde_json::json;

    fn parts(method: &str, uri: &str, headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn routes() -> RouteTable {
        RouteTable::compile(&json!({ "users/{id}": { "GET": {} } })).unwrap()
    }

    #[test]
    fn test_builds_event_for_matched_route() {
        let parts = parts(
            "GET",
            "/users/42?active=true",
            &[("Referer", "http://localhost/"), ("X-Custom", "1")],
        );
        let raw = RawRequest::from_parts(&parts, json!({}), "req-1");
        let event = build_event(raw, &routes()).unwrap();

        assert_eq!(event.request_context.resource_path, "/users/{id}");
        assert_eq!(event.request_context.http_method, "GET");
        assert_eq!(event.request_context.request_id, "req-1");
        assert!(event.request_context.authorizer.claims.is_empty());
        assert_eq!(event.path_parameters["id"], "42");
        assert_eq!(event.query_string_parameters["active"], "true");
        assert_eq!(event.headers["referer"], "http://localhost/");
        assert_eq!(event.headers["x-custom"], "1");
        assert_eq!(event.body, json!({}));
    }

    #[test]
    fn test_unmatched_request_uses_raw_path() {
        let parts = parts("POST", "/users/42", &[]);
        let raw = RawRequest::from_parts(&parts, json!({ "name": "n" }), "req-2");
        let event = build_event(raw, &routes()).unwrap();

        assert_eq!(event.request_context.resource_path, "/users/42");
        assert!(event.path_parameters.is_empty());
        assert_eq!(event.body["name"], "n");
    }

    #[test]
    fn test_claims_are_decoded_into_authorizer() {
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"sub":"abc"}"#);
        let auth = format!("Bearer eyJhbGciOiJub25lIn0.{payload}.");
        let parts = parts("GET", "/users/1", &[("Authorization", &auth)]);
        let event = build_event(RawRequest::from_parts(&parts, json!({}), "r"), &routes()).unwrap();
        assert_eq!(event.request_context.authorizer.claims["sub"], "abc");
    }

    #[test]
    fn test_malformed_token_fails_event() {
        let parts = parts("GET", "/users/1", &[("Authorization", "Bearer nonsense")]);
        let result = build_event(RawRequest::from_parts(&parts, json!({}), "r"), &routes());
        assert!(result.is_err());
    }

    #[test]
    fn test_event_serializes_in_gateway_shape() {
        let parts = parts("GET", "/users/9", &[]);
        let event = build_event(RawRequest::from_parts(&parts, json!({}), "r"), &routes()).unwrap();
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["requestContext"]["resourcePath"], "/users/{id}");
        assert_eq!(value["requestContext"]["httpMethod"], "GET");
        assert_eq!(value["requestContext"]["authorizer"]["claims"], json!({}));
        assert_eq!(value["pathParameters"], json!({ "id": "9" }));
        assert_eq!(value["queryStringParameters"], json!({}));
    }

    #[test]
    fn test_query_is_decoded_and_last_value_wins() {
        let parts = parts("GET", "/s?q=a%20b&tag=1&tag=2&plus=x+y", &[]);
        let raw = RawRequest::from_parts(&parts, json!({}), "r");
        assert_eq!(raw.query["q"], "a b");
        assert_eq!(raw.query["tag"], "2");
        assert_eq!(raw.query["plus"], "x y");
    }

    #[test]
    fn test_repeated_headers_are_joined() {
        let mut parts = parts("GET", "/", &[]);
        parts.headers.append("accept", HeaderValue::from_static("text/html"));
        parts.headers.append("accept", HeaderValue::from_static("application/json"));
        let raw = RawRequest::from_parts(&parts, json!({}), "r");
        assert_eq!(raw.headers["accept"], "text/html, application/json");
    }

    #[test]
    fn test_parse_body_by_content_type() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_body(&headers, b"").unwrap(), json!({}));
        assert_eq!(parse_body(&headers, b"plain text").unwrap(), json!({}));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert_eq!(parse_body(&headers, br#"{"a":[1,2]}"#).unwrap(), json!({ "a": [1, 2] }));
        assert!(matches!(
            parse_body(&headers, b"{oops"),
            Err(BodyError::InvalidJson(_))
        ));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        assert_eq!(
            parse_body(&headers, b"name=Ada+L&lang=rust").unwrap(),
            json!({ "name": "Ada L", "lang": "rust" })
        );
    }
}
