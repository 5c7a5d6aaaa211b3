//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use secret_keeper_core::SecretsError;
use tracing::error;

/// Seconds a client is asked to wait before retrying an unavailable store
pub const RETRY_AFTER_SECONDS: u64 = 5;

/// Secrets endpoint errors with HTTP status code mapping
///
/// The status code comes from [`SecretsError::status_code`]:
///
/// - `400 Bad Request`: malformed body, unresolvable namespace, unsupported
///   method or a value the store rejects
/// - `401 Unauthorized`: the namespace was determined but may not be managed
/// - `403`/`404`/`409`: store-reported forbidden, missing or conflicting secret
/// - `500 Internal Server Error`: unclassified store failure
/// - `503 Service Unavailable`: store temporarily unavailable, with `Retry-After`
///
/// # Security Considerations
///
/// Internal failures are logged server-side with full detail but only a
/// generic message reaches the client.
#[derive(Debug, thiserror::Error)]
pub enum SecretsHandlerError {
    #[error(transparent)]
    Secrets(#[from] SecretsError),
}

impl SecretsHandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Secrets(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl IntoResponse for SecretsHandlerError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, retry_after) = match &self {
            Self::Secrets(e @ SecretsError::StoreInternal { .. }) => {
                error!(error = %e, "Internal server error occurred");
                (
                    "Internal server error occurred. Please try again later.".to_string(),
                    None,
                )
            }
            Self::Secrets(e) if e.is_transient() => (e.to_string(), Some(RETRY_AFTER_SECONDS)),
            Self::Secrets(e) => (e.to_string(), None),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let mut response = (status, Json(body)).into_response();

        if let Some(retry_seconds) = retry_after {
            if let Ok(header_value) = retry_seconds.to_string().parse() {
                response.headers_mut().insert("Retry-After", header_value);
            }
        }

        response
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Secret store initialization failed: {message}")]
    StoreInitialization { message: String },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for '{key}': {message}")]
    Invalid { key: String, message: String },

    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
