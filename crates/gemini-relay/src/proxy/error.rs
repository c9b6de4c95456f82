//! HTTP-facing errors for the chat endpoint
//!
//! - Validation errors: 400 with a fixed JSON body
//! - Everything else before the first streamed byte: 500 with a plain-text body
//!
//! Failures after streaming has started never reach this type; they abort
//! the response body instead.

use axum::{
    body::Body,
    http::{Response, StatusCode, header},
    response::IntoResponse,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::error::RelayError;

/// Body returned for every request-shape failure
pub const INVALID_REQUEST_BODY: &str = r#"{"error":"Invalid request data"}"#;

/// Errors that end a chat request before streaming starts
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Request body failed validation or named an unknown safety setting
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Provider rejected the request
    #[error("Upstream error: {status}")]
    Upstream { status: StatusCode, body: String },

    /// Network, configuration or stream failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ProxyError::InvalidRequest(_) => "request",
            ProxyError::Upstream { .. } => "upstream",
            ProxyError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { .. } | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<RelayError> for ProxyError {
    fn from(e: RelayError) -> Self {
        match e {
            RelayError::Validation(message) => ProxyError::InvalidRequest(message),
            RelayError::Upstream { status, body } => ProxyError::Upstream { status, body },
            other => ProxyError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response<Body> {
        let status = self.status();

        let response = match &self {
            ProxyError::InvalidRequest(message) => {
                warn!(
                    error_type = self.category(),
                    error_message = %message,
                    "Request validation failed"
                );
                Response::builder()
                    .status(status)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(INVALID_REQUEST_BODY))
            }
            ProxyError::Upstream { status: upstream, body } => {
                error!(
                    error_type = self.category(),
                    upstream_status = %upstream,
                    body_length = body.len(),
                    "Provider rejected the request"
                );
                Response::builder()
                    .status(status)
                    .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                    .body(Body::from(self.to_string()))
            }
            ProxyError::Internal(message) => {
                error!(
                    error_type = self.category(),
                    error_message = %message,
                    "Chat request failed"
                );
                Response::builder()
                    .status(status)
                    .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                    .body(Body::from(self.to_string()))
            }
        };

        response.unwrap_or_else(|_| status.into_response())
    }
}
