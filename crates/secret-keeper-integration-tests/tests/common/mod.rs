//! Common test utilities for secret-keeper-api integration tests
//!
//! This module provides:
//! - A recording secret store that captures every call it receives
//! - Helpers for building the router around any store
//! - Request and response helpers

use async_trait::async_trait;
use axum::{
    body::Body,
    http::Request,
    response::Response,
    Router,
};
use secret_keeper_api::{create_router, AppState, ServiceConfig, ServiceMetrics};
use secret_keeper_core::{
    ClassifiedOutcome, DefaultNamespaceResolver, ErrorClassifier, KindClassifier, Namespace,
    OutcomeStatus, SecretName, SecretRecord, SecretStore, SecretsHandler,
    StaticNamespaceAuthorizer, StoreErrorKind,
};
use std::sync::{Arc, Mutex};

/// Default namespace used by every test app
pub const DEFAULT_NAMESPACE: &str = "openfaas-fn";

/// Extra namespace the test apps allow
pub const TENANT_NAMESPACE: &str = "tenant-a";

// ============================================================================
// Recording Store
// ============================================================================

/// A call received by [`RecordingStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)]
pub enum StoreCall {
    List { namespace: String },
    Create { namespace: String, name: String, value: Vec<u8> },
    Replace { namespace: String, name: String, value: Vec<u8> },
    Delete { namespace: String, name: String },
}

/// Error returned by [`RecordingStore`] when told to fail
#[derive(Debug, Clone, thiserror::Error)]
#[error("recording store failure ({status:?}): {message}")]
pub struct RecordingStoreError {
    pub status: Option<OutcomeStatus>,
    pub message: String,
}

impl StoreErrorKind for RecordingStoreError {
    fn outcome_status(&self) -> Option<OutcomeStatus> {
        self.status
    }
}

/// Store double that records calls and returns preset results
#[derive(Clone, Default)]
pub struct RecordingStore {
    calls: Arc<Mutex<Vec<StoreCall>>>,
    listing: Arc<Mutex<Vec<String>>>,
    failure: Arc<Mutex<Option<RecordingStoreError>>>,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names returned by `list`, in this order
    pub fn set_listing(&self, names: &[&str]) {
        *self.listing.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
    }

    /// Make every subsequent call fail with the given kind
    pub fn set_failure(&self, status: Option<OutcomeStatus>, message: &str) {
        *self.failure.lock().unwrap() = Some(RecordingStoreError {
            status,
            message: message.to_string(),
        });
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: StoreCall) -> Result<(), RecordingStoreError> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().clone() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SecretStore for RecordingStore {
    type Error = RecordingStoreError;

    async fn list(&self, namespace: &Namespace) -> Result<Vec<SecretName>, RecordingStoreError> {
        self.record(StoreCall::List {
            namespace: namespace.to_string(),
        })?;

        Ok(self
            .listing
            .lock()
            .unwrap()
            .iter()
            .filter_map(|n| SecretName::new(n.clone()).ok())
            .collect())
    }

    async fn create(&self, record: &SecretRecord) -> Result<(), RecordingStoreError> {
        self.record(StoreCall::Create {
            namespace: record.namespace.to_string(),
            name: record.name.to_string(),
            value: record.value.expose_bytes().to_vec(),
        })
    }

    async fn replace(&self, record: &SecretRecord) -> Result<(), RecordingStoreError> {
        self.record(StoreCall::Replace {
            namespace: record.namespace.to_string(),
            name: record.name.to_string(),
            value: record.value.expose_bytes().to_vec(),
        })
    }

    async fn delete(
        &self,
        namespace: &Namespace,
        name: &SecretName,
    ) -> Result<(), RecordingStoreError> {
        self.record(StoreCall::Delete {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }
}

// ============================================================================
// App Builders
// ============================================================================

/// Build the router around a store and classifier
pub fn create_test_app_with<S, C>(store: S, classifier: C) -> Router
where
    S: SecretStore + 'static,
    C: ErrorClassifier<S::Error> + 'static,
{
    let default_namespace = Namespace::new(DEFAULT_NAMESPACE).unwrap();
    let authorizer = StaticNamespaceAuthorizer::new(
        default_namespace.clone(),
        vec![Namespace::new(TENANT_NAMESPACE).unwrap()],
    );
    let resolver = Arc::new(DefaultNamespaceResolver::new(
        default_namespace,
        Arc::new(authorizer),
    ));

    let handler = SecretsHandler::with_store(resolver, store, classifier);
    let metrics = ServiceMetrics::new().expect("metrics registry");

    create_router(AppState::new(ServiceConfig::default(), handler, metrics))
}

/// Build the router around a store whose errors know their kind
#[allow(dead_code)]
pub fn create_test_app<S>(store: S) -> Router
where
    S: SecretStore + 'static,
    S::Error: StoreErrorKind,
{
    create_test_app_with(store, KindClassifier)
}

/// Classifier that treats every store error as internal
#[allow(dead_code)]
pub fn classify_everything_internal(error: &RecordingStoreError) -> ClassifiedOutcome {
    ClassifiedOutcome::internal(error.to_string())
}

// ============================================================================
// Request / Response Helpers
// ============================================================================

/// Build a request to the secrets endpoint
#[allow(dead_code)]
pub fn secrets_request(method: &str, namespace: Option<&str>, body: &str) -> Request<Body> {
    let uri = match namespace {
        Some(ns) => format!("/system/secrets?namespace={}", ns),
        None => "/system/secrets".to_string(),
    };

    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read the response body as JSON
#[allow(dead_code)]
pub async fn read_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read the response body as raw bytes
#[allow(dead_code)]
pub async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
