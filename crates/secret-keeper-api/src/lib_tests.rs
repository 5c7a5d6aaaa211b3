//! Tests for the HTTP routing of secret requests.

use super::*;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use secret_keeper_core::{
    DefaultNamespaceResolver, Namespace, NamespaceResolver, ResolvedNamespace, SecretsError,
    SecretsResponse, StaticNamespaceAuthorizer,
};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

// ============================================================================
// Mock SecretOperations
// ============================================================================

/// Test double that records every executed operation and returns a preset
/// result.
struct MockOperations {
    executed: Mutex<Vec<(SecretOperation, String)>>,
    result: Result<SecretsResponse, SecretsError>,
}

impl MockOperations {
    fn returning(result: Result<SecretsResponse, SecretsError>) -> Self {
        Self {
            executed: Mutex::new(Vec::new()),
            result,
        }
    }

    fn executed(&self) -> Vec<(SecretOperation, String)> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl secret_keeper_core::SecretOperations for MockOperations {
    async fn execute(
        &self,
        operation: SecretOperation,
        namespace: &ResolvedNamespace,
        _body: &[u8],
    ) -> Result<SecretsResponse, SecretsError> {
        self.executed
            .lock()
            .unwrap()
            .push((operation, namespace.as_str().to_string()));
        self.result.clone()
    }
}

// ============================================================================
// Test helpers
// ============================================================================

fn ns(value: &str) -> Namespace {
    Namespace::new(value).unwrap()
}

fn test_resolver() -> Arc<dyn NamespaceResolver> {
    let authorizer = StaticNamespaceAuthorizer::new(ns("openfaas-fn"), vec![ns("tenant-a")]);
    Arc::new(DefaultNamespaceResolver::new(
        ns("openfaas-fn"),
        Arc::new(authorizer),
    ))
}

fn test_app(operations: Arc<MockOperations>) -> Router {
    let handler = SecretsHandler::new(test_resolver(), operations);
    let metrics = ServiceMetrics::new().expect("ServiceMetrics::new must succeed in tests");
    create_router(AppState::new(ServiceConfig::default(), handler, metrics))
}

fn secrets_request(method: &str, uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Routing tests
// ============================================================================

/// Verify that GET lists in the default namespace and returns the JSON array.
#[tokio::test]
async fn test_get_returns_listing() {
    let listing = vec![secret_keeper_core::SecretSummary {
        name: "db-pass".to_string(),
        namespace: "openfaas-fn".to_string(),
    }];
    let mock = Arc::new(MockOperations::returning(Ok(SecretsResponse::Listed(
        listing,
    ))));

    let response = test_app(mock.clone())
        .oneshot(secrets_request("GET", "/system/secrets", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!([{"name": "db-pass", "namespace": "openfaas-fn"}])
    );
    assert_eq!(
        mock.executed(),
        vec![(SecretOperation::List, "openfaas-fn".to_string())]
    );
}

/// Verify that the namespace query parameter selects the namespace.
#[tokio::test]
async fn test_namespace_query_parameter_is_used() {
    let mock = Arc::new(MockOperations::returning(Ok(SecretsResponse::Accepted {
        operation: SecretOperation::Create,
        name: secret_keeper_core::SecretName::new("db-pass").unwrap(),
    })));

    let response = test_app(mock.clone())
        .oneshot(secrets_request(
            "POST",
            "/system/secrets?namespace=tenant-a",
            r#"{"name":"db-pass","namespace":"evil","value":"x"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        mock.executed(),
        vec![(SecretOperation::Create, "tenant-a".to_string())]
    );
}

/// Verify that an unsupported method reaches the handler and is rejected
/// with 400 rather than 405.
#[tokio::test]
async fn test_unsupported_method_returns_400() {
    let mock = Arc::new(MockOperations::returning(Ok(SecretsResponse::Listed(
        vec![],
    ))));

    let response = test_app(mock.clone())
        .oneshot(secrets_request("PATCH", "/system/secrets", r#"{"name":"x"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("PATCH"));
    assert!(mock.executed().is_empty());
}

/// Verify that an unparsable query string gets the JSON error body.
#[tokio::test]
async fn test_repeated_namespace_parameter_returns_json_400() {
    let mock = Arc::new(MockOperations::returning(Ok(SecretsResponse::Listed(
        vec![],
    ))));

    let response = test_app(mock.clone())
        .oneshot(secrets_request(
            "GET",
            "/system/secrets?namespace=tenant-a&namespace=openfaas-fn",
            "",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], 400);
    assert!(body["timestamp"].is_string());
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Malformed secret request"));
    assert!(mock.executed().is_empty());
}

/// Verify that a namespace outside the allow-list is 401 for every method.
#[tokio::test]
async fn test_unauthorized_namespace_returns_401() {
    for method in ["GET", "POST", "PUT", "DELETE"] {
        let mock = Arc::new(MockOperations::returning(Ok(SecretsResponse::Listed(
            vec![],
        ))));

        let response = test_app(mock.clone())
            .oneshot(secrets_request(
                method,
                "/system/secrets?namespace=tenant-x",
                r#"{"name":"db-pass"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method}");
        assert!(mock.executed().is_empty());
    }
}

/// Verify that a transient store error carries Retry-After.
#[tokio::test]
async fn test_unavailable_store_sets_retry_after() {
    let mock = Arc::new(MockOperations::returning(Err(
        SecretsError::StoreUnavailable {
            reason: "throttled".to_string(),
        },
    )));

    let response = test_app(mock)
        .oneshot(secrets_request("GET", "/system/secrets", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers().get("Retry-After").unwrap(), "5");
}

/// Verify that internal store errors are not leaked to the client.
#[tokio::test]
async fn test_internal_store_error_is_generic() {
    let mock = Arc::new(MockOperations::returning(Err(
        SecretsError::StoreInternal {
            reason: "connection string postgres://admin:pw@db".to_string(),
        },
    )));

    let response = test_app(mock)
        .oneshot(secrets_request("GET", "/system/secrets", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(!body["error"].as_str().unwrap().contains("postgres"));
}

/// Verify that the correlation id is echoed or generated.
#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let mock = Arc::new(MockOperations::returning(Ok(SecretsResponse::Listed(
        vec![],
    ))));
    let id = CorrelationId::new().to_string();

    let request = Request::builder()
        .method("GET")
        .uri("/system/secrets")
        .header(CORRELATION_ID_HEADER, &id)
        .body(Body::empty())
        .unwrap();

    let response = test_app(mock.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.headers().get(CORRELATION_ID_HEADER).unwrap(), id.as_str());

    let response = test_app(mock)
        .oneshot(secrets_request("GET", "/system/secrets", ""))
        .await
        .unwrap();
    let generated = response
        .headers()
        .get(CORRELATION_ID_HEADER)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(generated.parse::<CorrelationId>().is_ok());
}

/// Verify that bodies above the configured limit are rejected.
#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mock = Arc::new(MockOperations::returning(Ok(SecretsResponse::Listed(
        vec![],
    ))));
    let mut config = ServiceConfig::default();
    config.server.max_body_size = 16;

    let handler = SecretsHandler::new(test_resolver(), mock.clone());
    let app = create_router(AppState::new(
        config,
        handler,
        ServiceMetrics::new().unwrap(),
    ));

    let response = app
        .oneshot(secrets_request(
            "POST",
            "/system/secrets",
            r#"{"name":"db-pass","value":"far too long for the limit"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(mock.executed().is_empty());
}

// ============================================================================
// Health and metrics tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let mock = Arc::new(MockOperations::returning(Ok(SecretsResponse::Listed(
        vec![],
    ))));

    let response = test_app(mock)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_metrics_count_secret_operations() {
    let mock = Arc::new(MockOperations::returning(Ok(SecretsResponse::Listed(
        vec![],
    ))));
    let app = test_app(mock);

    let response = app
        .clone()
        .oneshot(secrets_request("GET", "/system/secrets", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.contains(r#"secret_operations_total{operation="list",outcome="success"} 1"#));
}
