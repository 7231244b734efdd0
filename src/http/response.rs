//! Response translation.
//!
//! # Responsibilities
//! - Turn a handler outcome into status, headers and body
//! - Apply defaults (200, no headers, `{}`) to sparse descriptors
//! - Shape every per-request failure as 500 `{"message": ...}`
//! - Serialize the result onto the wire
//!
//! # Design Decisions
//! - Error branch is terminal and logged once, here
//! - JS-falsy status/body values fall back to the defaults
//! - Content type is only set when the handler did not choose one

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::app::HandlerError;
use crate::observability::logging;
use crate::security::claims::ClaimsDecodeError;

/// What a handler returns on success. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ResponseDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers
            .get_or_insert_with(Map::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Every way a single request can fail after its body was read.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Claims(#[from] ClaimsDecodeError),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("handler did not complete within {0:?}")]
    Timeout(Duration),

    #[error("handler dropped the dispatch context without completing")]
    Abandoned,
}

impl DispatchError {
    /// Best available trace for the error log.
    pub fn stack(&self) -> String {
        match self {
            DispatchError::Handler(HandlerError {
                stack: Some(stack), ..
            }) => stack.clone(),
            other => format!("Error: {other}\n    {other:?}"),
        }
    }
}

/// A translated response, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedResponse {
    pub status_code: u16,
    pub headers: Map<String, Value>,
    pub body: Value,
}

impl TranslatedResponse {
    fn error(message: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            headers: Map::new(),
            body: json!({ "message": message.into() }),
        }
    }
}

/// Translate a dispatch outcome. Errors are logged and become 500 `{message}`.
pub fn translate(outcome: Result<ResponseDescriptor, DispatchError>) -> TranslatedResponse {
    match outcome {
        Err(err) => {
            logging::log_error(&err.to_string(), &err.stack());
            TranslatedResponse::error(err.to_string())
        }
        Ok(response) => TranslatedResponse {
            status_code: response.status_code.filter(|code| *code != 0).unwrap_or(200),
            headers: response.headers.unwrap_or_default(),
            body: response
                .body
                .filter(|body| !is_falsy(body))
                .unwrap_or_else(|| Value::Object(Map::new())),
        },
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn header_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl IntoResponse for TranslatedResponse {
    fn into_response(self) -> Response {
        let Ok(status) = StatusCode::from_u16(self.status_code) else {
            let message = format!("invalid status code {}", self.status_code);
            tracing::error!(status_code = self.status_code, "Handler returned an invalid status code");
            return TranslatedResponse::error(message).into_response();
        };

        let (content_type, bytes) = match self.body {
            Value::String(text) => ("text/html; charset=utf-8", text.into_bytes()),
            other => ("application/json; charset=utf-8", other.to_string().into_bytes()),
        };

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
                tracing::warn!(header = %name, "Skipping invalid response header name");
                continue;
            };
            let values = match value {
                Value::Array(items) => items.iter().map(header_text).collect(),
                single => vec![header_text(single)],
            };
            headers.remove(&name);
            for value in values {
                match HeaderValue::from_str(&value) {
                    Ok(value) => {
                        headers.append(name.clone(), value);
                    }
                    Err(_) => {
                        tracing::warn!(header = %name, "Skipping invalid response header value")
                    }
                }
            }
        }
        if !headers.contains_key(header::CONTENT_TYPE) {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_empty_descriptor_gets_defaults() {
        let translated = translate(Ok(ResponseDescriptor::new()));
        assert_eq!(
            translated,
            TranslatedResponse {
                status_code: 200,
                headers: Map::new(),
                body: json!({}),
            }
        );
    }

    #[test]
    fn test_full_descriptor_passes_through() {
        let translated = translate(Ok(ResponseDescriptor::new()
            .status(201)
            .header("X-Id", "7")
            .body(json!({ "ok": true }))));
        assert_eq!(translated.status_code, 201);
        assert_eq!(translated.headers["X-Id"], "7");
        assert_eq!(translated.body, json!({ "ok": true }));
    }

    #[test]
    fn test_falsy_values_use_defaults() {
        let translated = translate(Ok(ResponseDescriptor {
            status_code: Some(0),
            headers: None,
            body: Some(Value::Null),
        }));
        assert_eq!(translated.status_code, 200);
        assert_eq!(translated.body, json!({}));

        for falsy in [json!(false), json!(0), json!("")] {
            let translated = translate(Ok(ResponseDescriptor::new().body(falsy)));
            assert_eq!(translated.body, json!({}));
        }
        let translated = translate(Ok(ResponseDescriptor::new().body(json!([]))));
        assert_eq!(translated.body, json!([]));
    }

    #[test]
    fn test_errors_become_500_with_message() {
        let translated = translate(Err(HandlerError::new("database unavailable").into()));
        assert_eq!(translated.status_code, 500);
        assert!(translated.headers.is_empty());
        assert_eq!(translated.body, json!({ "message": "database unavailable" }));

        let translated = translate(Err(DispatchError::Abandoned));
        assert_eq!(translated.status_code, 500);
        assert_eq!(
            translated.body["message"],
            "handler dropped the dispatch context without completing"
        );
    }

    #[test]
    fn test_descriptor_deserializes_from_handler_json() {
        let descriptor: ResponseDescriptor = serde_json::from_value(json!({
            "statusCode": 204,
            "headers": { "Cache-Control": "no-store" }
        }))
        .unwrap();
        assert_eq!(descriptor.status_code, Some(204));
        assert!(descriptor.body.is_none());
    }

    #[tokio::test]
    async fn test_wire_response_sets_json_content_type() {
        let response = translate(Ok(ResponseDescriptor::new()
            .status(201)
            .header("X-Id", 7)
            .body(json!({ "ok": true }))))
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-id"], "7");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json; charset=utf-8"
        );
        assert_eq!(body_json(response).await, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_wire_response_respects_handler_content_type() {
        let response = translate(Ok(ResponseDescriptor::new()
            .header("Content-Type", "text/plain")
            .header("Set-Cookie", json!(["a=1", "b=2"]))
            .body("hello")))
        .into_response();

        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        let cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies, ["a=1", "b=2"]);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_invalid_status_code_becomes_500() {
        let response = translate(Ok(ResponseDescriptor::new().status(42))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "invalid status code 42" })
        );
    }

    #[tokio::test]
    async fn test_invalid_headers_are_skipped() {
        let response = translate(Ok(ResponseDescriptor::new()
            .header("bad header", "x")
            .header("X-Ok", "yes")))
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ok"], "yes");
        assert_eq!(response.headers().len(), 2);
    }
}
