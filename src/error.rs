//! Error types for github-oauth-demo
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.
//! OAuth flow rejections are modelled separately by `OAuthError`
//! because they are surfaced to the browser as redirects, not errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Each variant maps to an HTTP status code and a JSON error body.
/// A failure is fatal to the request cycle that produced it only.
#[derive(Debug, Error)]
pub enum AppError {
    /// Validation error (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// HTTP client error talking to GitHub (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// GitHub answered with something we cannot use (502)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Session cookie could not be produced (500)
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::HttpClient(_) => "http_client",
            AppError::Upstream(_) => "upstream",
            AppError::Session(_) => "session",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, error_message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::HttpClient(_) | AppError::Upstream(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Session(_) | AppError::Config(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[self.error_type()]).inc();

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Rejections of the OAuth flow
///
/// These never become error responses; the coordinator turns them into
/// redirects carrying [`OAuthError::code`] as the `error` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OAuthError {
    /// Callback `state` did not match the nonce stored in the session
    #[error("OAuth state mismatch")]
    InvalidState,

    /// Token endpoint response carried no `access_token`
    #[error("GitHub did not return an access token")]
    BadToken,

    /// `action` query parameter missing or unrecognized
    #[error("Unknown action")]
    UnknownAction,
}

impl OAuthError {
    /// Value used for the `error` query parameter and metric labels
    pub fn code(&self) -> &'static str {
        match self {
            OAuthError::InvalidState => "invalid_state",
            OAuthError::BadToken => "bad_token",
            OAuthError::UnknownAction => "unknown_action",
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
