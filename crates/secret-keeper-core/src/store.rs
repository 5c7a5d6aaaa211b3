//! # Secret Store Interface
//!
//! The persistence collaborator. Stores own all secret state; the core makes
//! at most one store call per request and never retries.

use crate::namespace::Namespace;
use crate::secret::{SecretName, SecretRecord};
use async_trait::async_trait;
use std::sync::Arc;

/// Interface for namespace-partitioned secret storage
///
/// Each implementation brings its own error type. How those errors map onto
/// caller-facing outcomes is decided by an
/// [`ErrorClassifier`](crate::classifier::ErrorClassifier) chosen for the
/// store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// List the names of all secrets in a namespace
    async fn list(&self, namespace: &Namespace) -> Result<Vec<SecretName>, Self::Error>;

    /// Create a new secret; fails if the name is already taken
    async fn create(&self, record: &SecretRecord) -> Result<(), Self::Error>;

    /// Replace the value of an existing secret
    async fn replace(&self, record: &SecretRecord) -> Result<(), Self::Error>;

    /// Delete a secret by (namespace, name)
    async fn delete(&self, namespace: &Namespace, name: &SecretName) -> Result<(), Self::Error>;
}

#[async_trait]
impl<S> SecretStore for Arc<S>
where
    S: SecretStore + ?Sized,
{
    type Error = S::Error;

    async fn list(&self, namespace: &Namespace) -> Result<Vec<SecretName>, Self::Error> {
        (**self).list(namespace).await
    }

    async fn create(&self, record: &SecretRecord) -> Result<(), Self::Error> {
        (**self).create(record).await
    }

    async fn replace(&self, record: &SecretRecord) -> Result<(), Self::Error> {
        (**self).replace(record).await
    }

    async fn delete(&self, namespace: &Namespace, name: &SecretName) -> Result<(), Self::Error> {
        (**self).delete(namespace, name).await
    }
}
