//! Response types and query parameters for the API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use secret_keeper_core::{SecretsResponse, Timestamp};
use serde::{Deserialize, Serialize};

// ============================================================================
// Response Types
// ============================================================================

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: Timestamp,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Timestamp::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// HTTP form of a successful secret request
///
/// Listings are a JSON array of `{name, namespace}` with `200 OK`; accepted
/// writes are `202 Accepted` with an empty body.
#[derive(Debug)]
pub struct SecretsHttpResponse(pub SecretsResponse);

impl IntoResponse for SecretsHttpResponse {
    fn into_response(self) -> Response {
        match self.0 {
            SecretsResponse::Listed(secrets) => (StatusCode::OK, Json(secrets)).into_response(),
            SecretsResponse::Accepted { .. } => StatusCode::ACCEPTED.into_response(),
        }
    }
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters accepted by the secrets endpoint
#[derive(Debug, Default, Deserialize)]
pub struct SecretsQuery {
    /// Namespace the request targets; overrides the body's namespace
    pub namespace: Option<String>,
}
