//! Error types.
//!
//! Two families live here. [`Error`] is infrastructure: binding a port,
//! building the HTTP client, rejecting bad configuration. [`ProxyError`] is
//! per-request and always ends as a JSON envelope; it never escapes a
//! handler.

use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::response::{IntoResponse, Json, Response};

/// Startup and serve failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("configuration: {0}")]
    Config(String),
}

/// A request that could not be completed.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Missing or malformed input. Never reaches the network.
    #[error("{error}")]
    Validation {
        error: &'static str,
        message: Option<String>,
        required: Option<Vec<&'static str>>,
        missing: Option<Vec<&'static str>>,
    },

    /// The collaborator answered with a non-2xx status.
    #[error("{error}: {status}")]
    Upstream {
        error: &'static str,
        status: StatusCode,
        details: String,
    },

    /// Anything unexpected: transport faults, undecodable payloads.
    #[error("{error}: {message}")]
    Internal {
        error: &'static str,
        message: String,
    },

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl ProxyError {
    pub fn validation(error: &'static str) -> Self {
        Self::Validation { error, message: None, required: None, missing: None }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { error: "Internal server error", message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => *status,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn body(&self) -> ErrorBody<'_> {
        match self {
            Self::Validation { error, message, required, missing } => ErrorBody {
                error,
                details: None,
                message: message.as_deref(),
                required: required.as_deref(),
                missing: missing.as_deref(),
            },
            Self::Upstream { error, details, .. } => ErrorBody {
                error,
                details: Some(details.as_str()),
                ..ErrorBody::default()
            },
            Self::Internal { error, message } => ErrorBody {
                error,
                message: Some(message.as_str()),
                ..ErrorBody::default()
            },
            Self::MethodNotAllowed => ErrorBody {
                error: "Method not allowed",
                ..ErrorBody::default()
            },
        }
    }
}

/// The uniform error envelope: `{ error, details?, message?, required?, missing? }`.
#[derive(Debug, Default, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<&'a [&'static str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing: Option<&'a [&'static str]>,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn envelope(err: ProxyError) -> (StatusCode, Value) {
        let res = err.into_response();
        (res.status_code(), serde_json::from_slice(res.body()).unwrap())
    }

    #[test]
    fn upstream_status_and_text_are_mirrored() {
        let (status, body) = envelope(ProxyError::Upstream {
            error: "Upload to transfer.sh failed",
            status: StatusCode::BAD_GATEWAY,
            details: "  bad gateway\n".into(),
        });
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({ "error": "Upload to transfer.sh failed", "details": "  bad gateway\n" }));
    }

    #[test]
    fn internal_carries_only_a_message() {
        let (status, body) = envelope(ProxyError::internal("connection refused"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error", "message": "connection refused" }));
    }

    #[test]
    fn bare_validation_has_no_optional_fields() {
        let (status, body) = envelope(ProxyError::validation("Invalid deletion URL"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid deletion URL" }));
    }
}
