//! Request error taxonomy.

use std::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generic message for failures where no response was obtained.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error: unable to reach the server";

/// Categories of request errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestErrorKind {
    /// Non-2xx response
    HttpStatus,
    /// No response obtained (connect, timeout, body read)
    Network,
    /// 2xx response whose body did not match the expected shape
    Parse,
    /// Rejected locally before anything was sent
    Validation,
}

impl fmt::Display for RequestErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestErrorKind::HttpStatus => write!(f, "http_status"),
            RequestErrorKind::Network => write!(f, "network"),
            RequestErrorKind::Parse => write!(f, "parse"),
            RequestErrorKind::Validation => write!(f, "validation"),
        }
    }
}

/// Structured error from one logical API call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestError {
    pub kind: RequestErrorKind,
    /// HTTP status, for `HttpStatus` errors
    pub status: Option<u16>,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (raw body, transport error)
    pub details: Option<String>,
}

impl RequestError {
    pub fn new(kind: RequestErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error.
    ///
    /// The message is the server's `detail` (or `message`) when the body is
    /// JSON carrying one, otherwise the status reason phrase.
    pub fn http_status(status: StatusCode, body: &str) -> Self {
        let message = server_message(body)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        Self {
            kind: RequestErrorKind::HttpStatus,
            status: Some(status.as_u16()),
            message,
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Creates a network error; transport details are kept out of the message.
    pub fn network(err: &reqwest::Error) -> Self {
        Self {
            details: Some(err.to_string()),
            ..Self::new(RequestErrorKind::Network, NETWORK_ERROR_MESSAGE)
        }
    }

    pub fn parse(details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(RequestErrorKind::Parse, "Unexpected response from the server")
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(RequestErrorKind::Validation, message)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RequestError {}

/// Extracts a human message from an error body.
///
/// Handles `{"detail": "..."}`, validation errors shaped like
/// `{"detail": [{"msg": "..."}]}` and `{"message": "..."}`.
fn server_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;

    let message = match json.get("detail") {
        Some(Value::String(detail)) => Some(detail.clone()),
        Some(Value::Array(items)) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
    .or_else(|| {
        json.get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    message.filter(|m| !m.trim().is_empty())
}
