//! # Secret-Keeper HTTP Service
//!
//! HTTP surface for namespace-scoped secret management.
//!
//! This service provides:
//! - The secrets endpoint (list, create, replace, delete) on one path
//! - Health check endpoint
//! - Prometheus metrics endpoint
//!
//! Every method is routed to the secrets handler so that namespace
//! resolution runs before the method is checked.

pub mod config;
pub mod errors;
pub mod metrics;
pub mod responses;

pub use config::{LoggingConfig, SecretsConfig, ServerConfig, ServiceConfig, StoreConfig};
pub use errors::{ConfigError, SecretsHandlerError, ServiceError};
pub use metrics::ServiceMetrics;
pub use responses::{HealthResponse, SecretsHttpResponse, SecretsQuery};

use axum::{
    extract::{rejection::QueryRejection, DefaultBodyLimit, Query, State},
    http::{Method, StatusCode},
    middleware,
    response::{Json, Response},
    routing::{any, get},
    Router,
};
use bytes::Bytes;
use metrics::OUTCOME_SUCCESS;
use secret_keeper_core::{
    CorrelationId, SecretMethod, SecretOperation, SecretRequest, SecretsError, SecretsHandler,
};
use std::{future::IntoFuture, sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

/// Header carrying the request correlation id
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: ServiceConfig,

    /// Resolves, dispatches and executes secret requests
    pub handler: SecretsHandler,

    /// Metrics collector for observability
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ServiceConfig, handler: SecretsHandler, metrics: Arc<ServiceMetrics>) -> Self {
        Self {
            config,
            handler,
            metrics,
        }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let secret_routes = Router::new().route(&state.config.server.endpoint_path, any(handle_secrets));

    let health_routes = Router::new().route("/health", get(handle_health_check));

    let observability_routes = Router::new().route("/metrics", get(metrics_endpoint));

    let mut router = Router::new()
        .merge(secret_routes)
        .merge(health_routes)
        .merge(observability_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(state.config.server.max_body_size))
                .into_inner(),
        );

    if state.config.server.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}

/// Start HTTP server
///
/// Runs until SIGINT or SIGTERM. In-flight requests get
/// `server.shutdown_timeout_seconds` to finish before the server stops.
pub async fn start_server(config: ServiceConfig, handler: SecretsHandler) -> Result<(), ServiceError> {
    let metrics = ServiceMetrics::new().map_err(|e| {
        ServiceError::Configuration(ConfigError::invalid(
            "metrics",
            format!("Failed to initialize metrics: {}", e),
        ))
    })?;

    let address = format!("{}:{}", config.server.host, config.server.port);
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);

    let state = AppState::new(config, handler, metrics);
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind(&address)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: address.clone(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", address);

    let (signal_tx, mut signal_rx) = tokio::sync::watch::channel(false);
    let shutdown = async move {
        shutdown_signal(shutdown_timeout).await;
        let _ = signal_tx.send(true);
    };

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|e| ServiceError::ServerFailed {
                message: e.to_string(),
            })?;
        }
        _ = async {
            let _ = signal_rx.wait_for(|fired| *fired).await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            warn!(
                timeout_seconds = shutdown_timeout.as_secs(),
                "Graceful shutdown timed out; dropping in-flight requests"
            );
        }
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

async fn shutdown_signal(shutdown_timeout: Duration) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
        },
    }
}

// ============================================================================
// Secret Handlers
// ============================================================================

/// Handle a secret request of any method
///
/// The `namespace` query parameter, when present, takes precedence over the
/// namespace named in the body. A query string that cannot be parsed is a
/// malformed request.
#[instrument(skip(state, query, body))]
pub async fn handle_secrets(
    State(state): State<AppState>,
    method: Method,
    query: Result<Query<SecretsQuery>, QueryRejection>,
    body: Bytes,
) -> Result<SecretsHttpResponse, SecretsHandlerError> {
    let start = std::time::Instant::now();

    let secret_method = SecretMethod::from_http_method(method.as_str());
    let operation = SecretOperation::from_method(&secret_method)
        .map(|op| op.as_str())
        .unwrap_or("unsupported");

    let result = match query {
        Ok(Query(query)) => {
            let mut request = SecretRequest::new(secret_method, body);
            if let Some(namespace) = query.namespace {
                request = request.with_namespace_param(namespace);
            }
            state.handler.handle(request).await
        }
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected secrets query string");
            Err(SecretsError::MalformedRequest {
                reason: rejection.body_text(),
            })
        }
    };

    let outcome = match &result {
        Ok(_) => OUTCOME_SUCCESS,
        Err(e) => e.kind(),
    };
    state
        .metrics
        .record_secret_operation(operation, outcome, start.elapsed());

    result
        .map(SecretsHttpResponse)
        .map_err(SecretsHandlerError::from)
}

// ============================================================================
// Health and Observability Handlers
// ============================================================================

/// Basic health check endpoint
async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Prometheus metrics endpoint
#[instrument(skip_all)]
async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.metrics.encode().map_err(|e| {
        error!(error = %e, "Failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware
///
/// Reuses the caller's `x-correlation-id` when it is a valid id, otherwise
/// generates one. The id is stored in request extensions and echoed on the
/// response.
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<CorrelationId>().ok())
        .unwrap_or_default();

    tracing::Span::current().record("correlation_id", tracing::field::display(&correlation_id));
    request.extensions_mut().insert(correlation_id.clone());

    info!(
        correlation_id = %correlation_id,
        method = %method,
        uri = %uri,
        "Request started"
    );

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.to_string().parse() {
        response
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, header_value);
    }

    let status = response.status();

    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

/// Records request count and latency per method and status
async fn metrics_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let start = std::time::Instant::now();
    let method = request.method().clone();

    let response = next.run(request).await;

    state
        .metrics
        .record_http_request(method.as_str(), response.status().as_u16(), start.elapsed());

    response
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
