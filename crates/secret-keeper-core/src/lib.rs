//! # Secret-Keeper Core
//!
//! Core business logic for the Secret-Keeper namespace-scoped secret service.
//!
//! This crate decides which tenant namespace a secret request may act upon,
//! dispatches the request to a secret store and classifies store failures
//! into a small, stable set of caller-facing outcomes.
//!
//! ## Architecture
//!
//! The core follows clean architecture principles:
//! - Business logic depends only on trait abstractions
//! - Store and authorization implementations are injected at runtime
//! - Nothing in this crate knows about HTTP; the API crate maps requests and
//!   responses onto the transport
//!
//! ## Usage
//!
//! ```rust
//! use secret_keeper_core::{Namespace, SecretName};
//!
//! let namespace = Namespace::new("tenant-a").unwrap();
//! let name = SecretName::new("db-pass").unwrap();
//! assert_eq!(namespace.as_str(), "tenant-a");
//! assert_eq!(name.as_str(), "db-pass");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use uuid::Uuid;

// ============================================================================
// Shared Types
// ============================================================================

/// UTC point in time, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Per-request id carried in the `x-correlation-id` header
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CorrelationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Uuid>().map(Self)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error type for input validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' has invalid format: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    TooLong { field: String, max_length: usize },

    #[error("Field '{field}' contains invalid characters: {invalid_chars}")]
    InvalidCharacters {
        field: String,
        invalid_chars: String,
    },
}

// ============================================================================
// Module declarations
// ============================================================================

/// Secret records, names and values
pub mod secret;

/// Namespace resolution and authorization
pub mod namespace;

/// Store error classification
pub mod classifier;

/// Secret store interface
pub mod store;

/// Secret operation dispatch
pub mod dispatcher;

/// Store adapters module for infrastructure implementations
pub mod adapters;

// Re-export key types for convenience
pub use adapters::{FilesystemSecretStore, InMemorySecretStore};
pub use classifier::{
    ClassifiedOutcome, ErrorClassifier, KindClassifier, OutcomeStatus, StoreErrorKind,
};
pub use dispatcher::{
    SecretDispatcher, SecretOperation, SecretOperations, SecretsError, SecretsHandler,
    SecretsResponse,
};
pub use namespace::{
    AuthorizationError, DefaultNamespaceResolver, Namespace, NamespaceAuthorizer,
    NamespaceResolver, ResolutionFailure, ResolvedNamespace, SecretMethod, SecretRequest,
    StaticNamespaceAuthorizer,
};
pub use secret::{DecodeError, SecretName, SecretPayload, SecretRecord, SecretSummary, SecretValue};
pub use store::SecretStore;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
