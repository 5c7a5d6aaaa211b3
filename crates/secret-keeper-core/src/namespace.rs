//! # Namespace Module
//!
//! Decides which tenant namespace a secret request acts upon and whether the
//! service may manage secrets there.
//!
//! Resolution is side-effect free and runs before the request method is
//! inspected, so it behaves identically for every operation. Failures are
//! returned as a tagged [`ResolutionFailure`] so callers switch on the kind
//! rather than on error text.

use crate::ValidationError;
use async_trait::async_trait;
use bytes::Bytes;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt,
    str::FromStr,
    sync::{Arc, LazyLock},
};
use tracing::debug;

/// Maximum namespace length (DNS-1123 label limit)
pub const MAX_NAMESPACE_LENGTH: usize = 63;

static NAMESPACE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("namespace pattern is a valid regex")
});

// ============================================================================
// Core Types
// ============================================================================

/// Tenant boundary that secrets are partitioned by
///
/// Must be a DNS-1123 label: 1-63 lowercase alphanumerics or '-', starting
/// and ending with an alphanumeric character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Create new namespace with validation
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if value.is_empty() {
            return Err(ValidationError::Required {
                field: "namespace".to_string(),
            });
        }

        if value.len() > MAX_NAMESPACE_LENGTH {
            return Err(ValidationError::TooLong {
                field: "namespace".to_string(),
                max_length: MAX_NAMESPACE_LENGTH,
            });
        }

        if !NAMESPACE_PATTERN.is_match(&value) {
            return Err(ValidationError::InvalidFormat {
                field: "namespace".to_string(),
                message: format!("'{}' is not a valid DNS-1123 label", value),
            });
        }

        Ok(Self(value))
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Namespace {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Namespace {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Namespace> for String {
    fn from(value: Namespace) -> Self {
        value.0
    }
}

/// Namespace that has been determined and authorized for one request
///
/// Every store call made for the request uses this namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNamespace(Namespace);

impl ResolvedNamespace {
    pub fn new(namespace: Namespace) -> Self {
        Self(namespace)
    }

    pub fn namespace(&self) -> &Namespace {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ResolvedNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request method as seen by the secret handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretMethod {
    /// List secrets (GET)
    Read,
    /// Create a secret (POST)
    Create,
    /// Replace a secret (PUT)
    Update,
    /// Delete a secret (DELETE)
    Delete,
    /// Any other method; rejected after resolution
    Unsupported(String),
}

impl SecretMethod {
    /// Map an HTTP method name onto a secret method
    pub fn from_http_method(method: &str) -> Self {
        match method {
            "GET" => Self::Read,
            "POST" => Self::Create,
            "PUT" => Self::Update,
            "DELETE" => Self::Delete,
            other => Self::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Unsupported(method) => method,
        }
    }
}

impl fmt::Display for SecretMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transport-neutral secret request
#[derive(Debug, Clone)]
pub struct SecretRequest {
    pub method: SecretMethod,

    /// Namespace named outside the body (e.g. the `namespace` query parameter)
    pub namespace_param: Option<String>,

    pub body: Bytes,
}

impl SecretRequest {
    pub fn new(method: SecretMethod, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            namespace_param: None,
            body: body.into(),
        }
    }

    pub fn with_namespace_param(mut self, namespace: impl Into<String>) -> Self {
        self.namespace_param = Some(namespace.into());
        self
    }
}

// ============================================================================
// Interface Traits
// ============================================================================

/// Capability check: may secrets be managed in a namespace?
#[async_trait]
pub trait NamespaceAuthorizer: Send + Sync {
    /// # Errors
    /// - `AuthorizationError::Unavailable` - The decision could not be made
    async fn can_manage_secrets(&self, namespace: &Namespace) -> Result<bool, AuthorizationError>;
}

/// Determines and authorizes the namespace for a request
#[async_trait]
pub trait NamespaceResolver: Send + Sync {
    async fn resolve(
        &self,
        request: &SecretRequest,
    ) -> Result<ResolvedNamespace, ResolutionFailure>;
}

// ============================================================================
// Implementations
// ============================================================================

/// Authorizer backed by a fixed set of namespaces
///
/// The default namespace is always part of the set.
#[derive(Debug, Clone)]
pub struct StaticNamespaceAuthorizer {
    allowed: BTreeSet<Namespace>,
}

impl StaticNamespaceAuthorizer {
    pub fn new(default_namespace: Namespace, allowed: impl IntoIterator<Item = Namespace>) -> Self {
        let mut allowed: BTreeSet<Namespace> = allowed.into_iter().collect();
        allowed.insert(default_namespace);
        Self { allowed }
    }

    pub fn allowed_namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.allowed.iter()
    }
}

#[async_trait]
impl NamespaceAuthorizer for StaticNamespaceAuthorizer {
    async fn can_manage_secrets(&self, namespace: &Namespace) -> Result<bool, AuthorizationError> {
        Ok(self.allowed.contains(namespace))
    }
}

#[derive(Deserialize)]
struct DeclaredNamespace {
    #[serde(default)]
    namespace: Option<String>,
}

/// Resolver used by the service
///
/// The declared namespace is, in order: the namespace parameter; the body's
/// `namespace` field for non-read requests; otherwise the default namespace.
#[derive(Clone)]
pub struct DefaultNamespaceResolver {
    default_namespace: Namespace,
    authorizer: Arc<dyn NamespaceAuthorizer>,
}

impl DefaultNamespaceResolver {
    pub fn new(default_namespace: Namespace, authorizer: Arc<dyn NamespaceAuthorizer>) -> Self {
        Self {
            default_namespace,
            authorizer,
        }
    }

    pub fn default_namespace(&self) -> &Namespace {
        &self.default_namespace
    }

    fn declared_namespace(
        &self,
        request: &SecretRequest,
    ) -> Result<Option<String>, ResolutionFailure> {
        if let Some(param) = request.namespace_param.as_deref() {
            if !param.is_empty() {
                return Ok(Some(param.to_string()));
            }
        }

        if request.method == SecretMethod::Read
            || request.body.iter().all(u8::is_ascii_whitespace)
        {
            return Ok(None);
        }

        let malformed = |e: serde_json::Error| ResolutionFailure::MalformedRequest {
            reason: e.to_string(),
        };
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(&request.body).map_err(malformed)?;
        let declared: DeclaredNamespace =
            serde_json::from_value(serde_json::Value::Object(object)).map_err(malformed)?;

        Ok(declared.namespace.filter(|ns| !ns.is_empty()))
    }
}

#[async_trait]
impl NamespaceResolver for DefaultNamespaceResolver {
    async fn resolve(
        &self,
        request: &SecretRequest,
    ) -> Result<ResolvedNamespace, ResolutionFailure> {
        let namespace = match self.declared_namespace(request)? {
            Some(raw) => Namespace::new(raw).map_err(|e| ResolutionFailure::MalformedRequest {
                reason: e.to_string(),
            })?,
            None => self.default_namespace.clone(),
        };

        match self.authorizer.can_manage_secrets(&namespace).await {
            Ok(true) => {
                debug!(namespace = %namespace, "Resolved secret namespace");
                Ok(ResolvedNamespace::new(namespace))
            }
            Ok(false) => Err(ResolutionFailure::Unauthorized { namespace }),
            Err(e) => Err(ResolutionFailure::Unknown {
                reason: e.to_string(),
            }),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Why a namespace could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionFailure {
    /// The request could not be parsed far enough to find a namespace
    #[error("Unable to read namespace from secret request: {reason}")]
    MalformedRequest { reason: String },

    /// The namespace was determined but secrets may not be managed there
    #[error("Unable to manage secrets within namespace '{namespace}'")]
    Unauthorized { namespace: Namespace },

    #[error("Unable to resolve namespace: {reason}")]
    Unknown { reason: String },
}

/// Errors raised while checking namespace capabilities
#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    #[error("Authorization backend unavailable: {message}")]
    Unavailable { message: String },
}

#[cfg(test)]
#[path = "namespace_tests.rs"]
mod tests;
