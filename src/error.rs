//! Proxy error type and JSON error bodies.
//!
//! Every failure surfaces to the client as
//! `{"error": true, "message": "..."}`, never as a panic or a bare body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message for paths no route claims.
pub const NOT_FOUND_MESSAGE: &str = "resource not found";

/// Prefix of every synthesized upstream failure message.
pub const PROXY_FAILED_PREFIX: &str = "proxy request failed";

/// Errors local to the proxy. Upstream 4xx/5xx responses are not errors;
/// they are relayed as-is.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// DNS, connect, TLS or timeout failure talking to the upstream.
    #[error("{}", error_chain(.0))]
    Upstream(#[source] reqwest::Error),

    #[error("invalid upstream target for '{path}': {reason}")]
    InvalidTarget { path: String, reason: String },

    #[error("failed to read request body: {0}")]
    RequestBody(String),

    #[error("failed to build upstream client: {}", error_chain(.0))]
    ClientBuild(#[source] reqwest::Error),
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        // The URL carries the access token; keep it out of client-visible text.
        ProxyError::Upstream(err.without_url())
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}: {}", PROXY_FAILED_PREFIX, self),
        )
    }
}

/// JSON error payload.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: bool,
    pub message: String,
}

/// Build a JSON error response.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        error: true,
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

/// Render an error with its `source()` chain, skipping causes already
/// contained in the text.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
