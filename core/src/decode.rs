//! Response normalization.
//!
//! # Design
//! Tyr answers the same endpoint with a list, an object, a status wrapper or
//! nothing at all depending on whether the referenced resource exists. The
//! client branches on the decoded shape instead of assuming a schema:
//! `decode_body` turns a raw body into an optional JSON value, and
//! `Decoded<T>` tags the result so callers match on it instead of sniffing
//! types.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::http::HttpResponse;

/// Outcome of decoding a shape-ambiguous response.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// The body decoded into the expected type.
    Found(T),
    /// The body was empty, `null` or not JSON.
    NotFound,
    /// Some other JSON, usually a status wrapper. Passed through unmodified
    /// whatever the status code was.
    Ambiguous(Value),
}

impl<T> Decoded<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Decoded::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Decoded::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_found(&self) -> Option<&T> {
        match self {
            Decoded::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        match self {
            Decoded::Found(value) => Decoded::Found(f(value)),
            Decoded::NotFound => Decoded::NotFound,
            Decoded::Ambiguous(raw) => Decoded::Ambiguous(raw),
        }
    }
}

/// Decode a body to JSON. Empty, non-JSON and `null` bodies yield `None`.
pub fn decode_body(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) | Err(_) => None,
        Ok(value) => Some(value),
    }
}

/// True for JSON objects carrying `error`, `message` or `status`, the
/// members Tyr uses in its error and status wrappers.
pub fn is_error_body(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| ["error", "message", "status"].iter().any(|k| obj.contains_key(*k)))
}

/// Decode into `T`, tagging anything that does not fit.
pub(crate) fn decode_tagged<T: DeserializeOwned>(response: &HttpResponse) -> Decoded<T> {
    let Some(value) = decode_body(&response.body) else {
        return Decoded::NotFound;
    };
    if is_error_body(&value) {
        return Decoded::Ambiguous(value);
    }
    match serde_json::from_value::<T>(value.clone()) {
        Ok(decoded) => Decoded::Found(decoded),
        Err(_) => Decoded::Ambiguous(value),
    }
}

/// Decode a list endpoint that normalizes every other shape to empty,
/// including a list whose elements do not fit `T`.
pub(crate) fn decode_list_or_empty<T: DeserializeOwned>(response: &HttpResponse) -> Vec<T> {
    match decode_body(&response.body) {
        Some(value @ Value::Array(_)) => match serde_json::from_value::<Vec<T>>(value.clone()) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(status = response.status, body = %value, error = %e, "malformed list, normalizing to empty");
                Vec::new()
            }
        },
        Some(other) => {
            tracing::warn!(status = response.status, body = %other, "expected a list, normalizing to empty");
            Vec::new()
        }
        None => Vec::new(),
    }
}
