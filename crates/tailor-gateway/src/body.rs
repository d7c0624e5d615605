//! Response body parsing and error-message extraction
//!
//! A response body is JSON when its `Content-Type` says so and plain text
//! otherwise. Failed responses are further reduced to an `ErrorBody`, which
//! decides the message shown to the user:
//!
//! 1. a plain string body is the message verbatim,
//! 2. otherwise a string `message` field inside a JSON object,
//! 3. otherwise the generic `UNKNOWN_API_ERROR`.

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Message used when a failed response carries nothing usable.
pub const UNKNOWN_API_ERROR: &str = "Unknown API error";

/// Parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
}

impl Body {
    /// JSON view of the body, if it was JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Text(_) => None,
        }
    }

    /// Text view of the body, if it was plain text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Json(_) => None,
            Body::Text(text) => Some(text),
        }
    }

    /// Convert into a JSON value; text becomes a JSON string.
    pub fn into_json(self) -> Value {
        match self {
            Body::Json(value) => value,
            Body::Text(text) => Value::String(text),
        }
    }

    /// Deserialize the body into a typed value.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.into_json()).map_err(|e| Error::Parse(e.to_string()))
    }
}

/// Whether a content type denotes JSON (`application/json`,
/// `application/problem+json`, ...).
pub fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|mime| mime.trim().to_ascii_lowercase().contains("json"))
        .unwrap_or(false)
}

/// Read and parse a response body according to its content type.
///
/// A JSON response with an empty body (e.g. 204) parses as `null`.
pub(crate) async fn read_body(response: reqwest::Response) -> Result<Body> {
    let json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_json_content_type);

    if json {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("reading response body: {e}")))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Body::Json(Value::Null));
        }
        serde_json::from_slice(&bytes)
            .map(Body::Json)
            .map_err(|e| Error::Parse(e.to_string()))
    } else {
        response
            .text()
            .await
            .map(Body::Text)
            .map_err(|e| Error::Transport(format!("reading response body: {e}")))
    }
}

/// Shape of a failed response's body, resolved once per response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorBody {
    PlainText(String),
    JsonWithMessage(String),
    JsonOpaque,
}

impl ErrorBody {
    pub fn classify(body: &Body) -> Self {
        match body {
            Body::Text(text) if !text.trim().is_empty() => ErrorBody::PlainText(text.clone()),
            // Blank text carries no message either
            Body::Text(_) => ErrorBody::JsonOpaque,
            // A JSON document that is just a string is still a plain message
            Body::Json(Value::String(text)) if !text.trim().is_empty() => {
                ErrorBody::PlainText(text.clone())
            }
            Body::Json(value) => match value.get("message").and_then(Value::as_str) {
                Some(message) if !message.trim().is_empty() => {
                    ErrorBody::JsonWithMessage(message.to_string())
                }
                _ => ErrorBody::JsonOpaque,
            },
        }
    }

    /// User-facing message for this body.
    pub fn into_message(self) -> String {
        match self {
            ErrorBody::PlainText(message) | ErrorBody::JsonWithMessage(message) => message,
            ErrorBody::JsonOpaque => UNKNOWN_API_ERROR.to_string(),
        }
    }
}
