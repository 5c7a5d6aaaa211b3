//! # Dispatcher Module
//!
//! Entry point for secret requests: resolve the namespace, select the
//! operation from the request method, decode the body, call the store and
//! translate the result.
//!
//! Control flow is strictly ordered. A resolution failure is returned before
//! the method is looked at, and decoding failures are returned before the
//! store is called. Store failures always go through the store's classifier.

use crate::classifier::{ClassifiedOutcome, ErrorClassifier, OutcomeStatus};
use crate::namespace::{
    Namespace, NamespaceResolver, ResolutionFailure, ResolvedNamespace, SecretMethod,
    SecretRequest,
};
use crate::secret::{DecodeError, SecretName, SecretPayload, SecretSummary};
use crate::store::SecretStore;
use async_trait::async_trait;
use std::{fmt, sync::Arc};
use tracing::{error, info, instrument, warn};

// ============================================================================
// Core Types
// ============================================================================

/// The four operations a request can select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretOperation {
    List,
    Create,
    Replace,
    Delete,
}

impl SecretOperation {
    /// Operation selected by a request method, if any
    pub fn from_method(method: &SecretMethod) -> Option<Self> {
        match method {
            SecretMethod::Read => Some(Self::List),
            SecretMethod::Create => Some(Self::Create),
            SecretMethod::Update => Some(Self::Replace),
            SecretMethod::Delete => Some(Self::Delete),
            SecretMethod::Unsupported(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Replace => "replace",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for SecretOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Successful result of a secret request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretsResponse {
    /// Secrets in the resolved namespace
    Listed(Vec<SecretSummary>),

    /// Write accepted by the store
    Accepted {
        operation: SecretOperation,
        name: SecretName,
    },
}

impl SecretsResponse {
    /// Status code for the transport (200 for reads, 202 for writes)
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Listed(_) => 200,
            Self::Accepted { .. } => 202,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Every way a secret request can fail
///
/// Status codes:
/// - `400`: malformed request, unresolvable namespace, unsupported method,
///   invalid input rejected by the store
/// - `401`: namespace not authorized
/// - `403`/`404`/`409`: store forbidden / not found / conflict
/// - `500`: unclassified store failure
/// - `503`: store temporarily unavailable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecretsError {
    #[error("Malformed secret request: {reason}")]
    MalformedRequest { reason: String },

    #[error("Unable to manage secrets within namespace '{namespace}'")]
    Unauthorized { namespace: Namespace },

    #[error("Unable to resolve namespace: {reason}")]
    UnresolvedNamespace { reason: String },

    #[error("Unsupported method: {method}")]
    UnsupportedOperation { method: String },

    #[error("Secret not found: {reason}")]
    StoreNotFound { reason: String },

    #[error("Secret already exists: {reason}")]
    StoreConflict { reason: String },

    #[error("Invalid secret: {reason}")]
    StoreInvalidInput { reason: String },

    #[error("Secret store denied access: {reason}")]
    StoreForbidden { reason: String },

    #[error("Secret store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("Secret store failure: {reason}")]
    StoreInternal { reason: String },
}

impl SecretsError {
    /// Build the error for a classified store failure
    pub fn from_outcome(outcome: ClassifiedOutcome) -> Self {
        let reason = outcome.reason;
        match outcome.status {
            OutcomeStatus::NotFound => Self::StoreNotFound { reason },
            OutcomeStatus::AlreadyExists => Self::StoreConflict { reason },
            OutcomeStatus::InvalidInput => Self::StoreInvalidInput { reason },
            OutcomeStatus::Forbidden => Self::StoreForbidden { reason },
            OutcomeStatus::Unavailable => Self::StoreUnavailable { reason },
            OutcomeStatus::Internal => Self::StoreInternal { reason },
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::MalformedRequest { .. }
            | Self::UnresolvedNamespace { .. }
            | Self::UnsupportedOperation { .. }
            | Self::StoreInvalidInput { .. } => 400,
            Self::Unauthorized { .. } => 401,
            Self::StoreForbidden { .. } => 403,
            Self::StoreNotFound { .. } => 404,
            Self::StoreConflict { .. } => 409,
            Self::StoreInternal { .. } => 500,
            Self::StoreUnavailable { .. } => 503,
        }
    }

    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest { .. } => "malformed_request",
            Self::Unauthorized { .. } => "unauthorized",
            Self::UnresolvedNamespace { .. } => "unresolved_namespace",
            Self::UnsupportedOperation { .. } => "unsupported_operation",
            Self::StoreNotFound { .. } => "not_found",
            Self::StoreConflict { .. } => "conflict",
            Self::StoreInvalidInput { .. } => "invalid_input",
            Self::StoreForbidden { .. } => "forbidden",
            Self::StoreUnavailable { .. } => "unavailable",
            Self::StoreInternal { .. } => "internal",
        }
    }

    /// Check if error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}

impl From<ResolutionFailure> for SecretsError {
    fn from(failure: ResolutionFailure) -> Self {
        match failure {
            ResolutionFailure::MalformedRequest { reason } => Self::MalformedRequest { reason },
            ResolutionFailure::Unauthorized { namespace } => Self::Unauthorized { namespace },
            ResolutionFailure::Unknown { reason } => Self::UnresolvedNamespace { reason },
        }
    }
}

impl From<DecodeError> for SecretsError {
    fn from(error: DecodeError) -> Self {
        Self::MalformedRequest {
            reason: error.to_string(),
        }
    }
}

// ============================================================================
// Interface Traits
// ============================================================================

/// Executes an already-selected operation in a resolved namespace
///
/// Object-safe face of [`SecretDispatcher`], so the handler does not need to
/// know the store or classifier types.
#[async_trait]
pub trait SecretOperations: Send + Sync {
    async fn execute(
        &self,
        operation: SecretOperation,
        namespace: &ResolvedNamespace,
        body: &[u8],
    ) -> Result<SecretsResponse, SecretsError>;
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Runs secret operations against one store with its classifier
pub struct SecretDispatcher<S, C> {
    store: S,
    classifier: C,
}

impl<S, C> SecretDispatcher<S, C>
where
    S: SecretStore,
    C: ErrorClassifier<S::Error>,
{
    pub fn new(store: S, classifier: C) -> Self {
        Self { store, classifier }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// List secrets; every entry carries the resolved namespace
    pub async fn list(
        &self,
        namespace: &ResolvedNamespace,
    ) -> Result<SecretsResponse, SecretsError> {
        let names = self
            .store
            .list(namespace.namespace())
            .await
            .map_err(|e| self.store_failure(SecretOperation::List, namespace, None, e))?;

        let secrets = names
            .iter()
            .map(|name| SecretSummary::new(name, namespace.namespace()))
            .collect();

        Ok(SecretsResponse::Listed(secrets))
    }

    /// Create a secret in the resolved namespace
    pub async fn create(
        &self,
        namespace: &ResolvedNamespace,
        body: &[u8],
    ) -> Result<SecretsResponse, SecretsError> {
        let record = decode(SecretOperation::Create, body)?.into_record(namespace)?;

        self.store.create(&record).await.map_err(|e| {
            self.store_failure(SecretOperation::Create, namespace, Some(&record.name), e)
        })?;

        info!(secret = %record.name, namespace = %namespace, "Secret created");
        Ok(SecretsResponse::Accepted {
            operation: SecretOperation::Create,
            name: record.name,
        })
    }

    /// Replace a secret in the resolved namespace
    pub async fn replace(
        &self,
        namespace: &ResolvedNamespace,
        body: &[u8],
    ) -> Result<SecretsResponse, SecretsError> {
        let record = decode(SecretOperation::Replace, body)?.into_record(namespace)?;

        self.store.replace(&record).await.map_err(|e| {
            self.store_failure(SecretOperation::Replace, namespace, Some(&record.name), e)
        })?;

        info!(secret = %record.name, namespace = %namespace, "Secret updated");
        Ok(SecretsResponse::Accepted {
            operation: SecretOperation::Replace,
            name: record.name,
        })
    }

    /// Delete a secret by name from the resolved namespace
    pub async fn delete(
        &self,
        namespace: &ResolvedNamespace,
        body: &[u8],
    ) -> Result<SecretsResponse, SecretsError> {
        let name = decode(SecretOperation::Delete, body)?.secret_name()?;

        self.store
            .delete(namespace.namespace(), &name)
            .await
            .map_err(|e| self.store_failure(SecretOperation::Delete, namespace, Some(&name), e))?;

        info!(secret = %name, namespace = %namespace, "Secret deleted");
        Ok(SecretsResponse::Accepted {
            operation: SecretOperation::Delete,
            name,
        })
    }

    fn store_failure(
        &self,
        operation: SecretOperation,
        namespace: &ResolvedNamespace,
        name: Option<&SecretName>,
        error: S::Error,
    ) -> SecretsError {
        let outcome = self.classifier.classify(&error);
        let secret = name.map(SecretName::as_str).unwrap_or_default();

        if outcome.status == OutcomeStatus::Internal {
            error!(
                operation = %operation,
                namespace = %namespace,
                secret = %secret,
                reason = %outcome.reason,
                error = %error,
                "Secret store operation failed"
            );
        } else {
            warn!(
                operation = %operation,
                namespace = %namespace,
                secret = %secret,
                outcome = %outcome.status,
                reason = %outcome.reason,
                error = %error,
                "Secret store rejected operation"
            );
        }

        SecretsError::from_outcome(outcome)
    }
}

fn decode(operation: SecretOperation, body: &[u8]) -> Result<SecretPayload, SecretsError> {
    SecretPayload::decode(body).map_err(|e| {
        warn!(operation = %operation, error = %e, "Secret unmarshal error");
        SecretsError::from(e)
    })
}

#[async_trait]
impl<S, C> SecretOperations for SecretDispatcher<S, C>
where
    S: SecretStore,
    C: ErrorClassifier<S::Error>,
{
    async fn execute(
        &self,
        operation: SecretOperation,
        namespace: &ResolvedNamespace,
        body: &[u8],
    ) -> Result<SecretsResponse, SecretsError> {
        match operation {
            SecretOperation::List => self.list(namespace).await,
            SecretOperation::Create => self.create(namespace, body).await,
            SecretOperation::Replace => self.replace(namespace, body).await,
            SecretOperation::Delete => self.delete(namespace, body).await,
        }
    }
}

// ============================================================================
// Handler
// ============================================================================

/// Single entry point the transport layer calls for every secret request
#[derive(Clone)]
pub struct SecretsHandler {
    resolver: Arc<dyn NamespaceResolver>,
    operations: Arc<dyn SecretOperations>,
}

impl SecretsHandler {
    pub fn new(resolver: Arc<dyn NamespaceResolver>, operations: Arc<dyn SecretOperations>) -> Self {
        Self {
            resolver,
            operations,
        }
    }

    /// Build a handler around a store and the classifier for its errors
    pub fn with_store<S, C>(resolver: Arc<dyn NamespaceResolver>, store: S, classifier: C) -> Self
    where
        S: SecretStore + 'static,
        C: ErrorClassifier<S::Error> + 'static,
    {
        Self::new(resolver, Arc::new(SecretDispatcher::new(store, classifier)))
    }

    /// Resolve, dispatch and execute one request
    ///
    /// A resolution failure wins over an unsupported method.
    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn handle(&self, request: SecretRequest) -> Result<SecretsResponse, SecretsError> {
        let namespace = self.resolver.resolve(&request).await.map_err(|failure| {
            warn!(error = %failure, "Namespace resolution failed");
            SecretsError::from(failure)
        })?;

        let operation = SecretOperation::from_method(&request.method).ok_or_else(|| {
            SecretsError::UnsupportedOperation {
                method: request.method.to_string(),
            }
        })?;

        self.operations
            .execute(operation, &namespace, &request.body)
            .await
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
