//! # In-Memory Secret Store Implementation
//!
//! Thread-safe in-memory implementation for testing and development.
//! Enforces the same naming and uniqueness rules a real backend would, so
//! classification paths can be exercised without infrastructure.

use super::is_dns_subdomain;
use crate::classifier::{OutcomeStatus, StoreErrorKind};
use crate::namespace::Namespace;
use crate::secret::{SecretName, SecretRecord, SecretValue};
use crate::store::SecretStore;
use crate::Timestamp;
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// Default maximum secret value size (1 MiB)
pub const DEFAULT_MAX_VALUE_SIZE: usize = 1024 * 1024;

type SecretKey = (Namespace, SecretName);

/// Stored secret with bookkeeping metadata
#[derive(Debug, Clone)]
pub struct StoredSecret {
    pub value: SecretValue,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,

    /// Incremented on every replace, starting at 1
    pub version: u64,
}

/// In-memory secret store
///
/// Uses RwLock for concurrent access with minimal contention. Clones share
/// the same underlying map.
///
/// # Example
///
/// ```rust
/// use secret_keeper_core::{
///     InMemorySecretStore, Namespace, SecretName, SecretRecord, SecretStore, SecretValue,
/// };
///
/// # tokio_test::block_on(async {
/// let store = InMemorySecretStore::new();
/// let namespace = Namespace::new("openfaas-fn").unwrap();
/// let record = SecretRecord::new(
///     SecretName::new("db-pass").unwrap(),
///     namespace.clone(),
///     SecretValue::from_string("s3cr3t".to_string()),
/// );
///
/// store.create(&record).await.unwrap();
/// assert_eq!(store.list(&namespace).await.unwrap().len(), 1);
/// # });
/// ```
#[derive(Clone)]
pub struct InMemorySecretStore {
    secrets: Arc<RwLock<HashMap<SecretKey, StoredSecret>>>,
    max_value_size: usize,
}

impl InMemorySecretStore {
    /// Create new empty store
    pub fn new() -> Self {
        Self {
            secrets: Arc::new(RwLock::new(HashMap::new())),
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
        }
    }

    /// Create store with a custom value size limit
    pub fn with_max_value_size(max_value_size: usize) -> Self {
        Self {
            max_value_size,
            ..Self::new()
        }
    }

    /// Create store pre-populated with secrets
    pub fn with_secrets(records: impl IntoIterator<Item = SecretRecord>) -> Self {
        let store = Self::new();
        let now = Timestamp::now();

        if let Ok(mut secrets) = store.secrets.write() {
            for record in records {
                secrets.insert(
                    (record.namespace, record.name),
                    StoredSecret {
                        value: record.value,
                        created_at: now,
                        updated_at: now,
                        version: 1,
                    },
                );
            }
        }

        store
    }

    /// Look up a stored secret
    pub fn get(&self, namespace: &Namespace, name: &SecretName) -> Option<StoredSecret> {
        let secrets = self.secrets.read().ok()?;
        secrets.get(&(namespace.clone(), name.clone())).cloned()
    }

    /// Number of secrets across all namespaces
    pub fn len(&self) -> usize {
        self.secrets.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self, record: &SecretRecord) -> Result<(), MemoryStoreError> {
        if !is_dns_subdomain(record.name.as_str()) {
            return Err(MemoryStoreError::InvalidName {
                name: record.name.clone(),
                reason: "must be a lowercase DNS-1123 subdomain".to_string(),
            });
        }

        if record.value.len() > self.max_value_size {
            return Err(MemoryStoreError::ValueTooLarge {
                size: record.value.len(),
                max_size: self.max_value_size,
            });
        }

        Ok(())
    }
}

impl Default for InMemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    type Error = MemoryStoreError;

    async fn list(&self, namespace: &Namespace) -> Result<Vec<SecretName>, MemoryStoreError> {
        let secrets = self
            .secrets
            .read()
            .map_err(|_| MemoryStoreError::LockPoisoned)?;

        let mut names: Vec<SecretName> = secrets
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();

        Ok(names)
    }

    async fn create(&self, record: &SecretRecord) -> Result<(), MemoryStoreError> {
        self.validate(record)?;

        let mut secrets = self
            .secrets
            .write()
            .map_err(|_| MemoryStoreError::LockPoisoned)?;

        let key = (record.namespace.clone(), record.name.clone());
        if secrets.contains_key(&key) {
            return Err(MemoryStoreError::AlreadyExists {
                namespace: record.namespace.clone(),
                name: record.name.clone(),
            });
        }

        let now = Timestamp::now();
        secrets.insert(
            key,
            StoredSecret {
                value: record.value.clone(),
                created_at: now,
                updated_at: now,
                version: 1,
            },
        );
        Ok(())
    }

    async fn replace(&self, record: &SecretRecord) -> Result<(), MemoryStoreError> {
        self.validate(record)?;

        let mut secrets = self
            .secrets
            .write()
            .map_err(|_| MemoryStoreError::LockPoisoned)?;

        let key = (record.namespace.clone(), record.name.clone());
        let stored = secrets
            .get_mut(&key)
            .ok_or_else(|| MemoryStoreError::NotFound {
                namespace: record.namespace.clone(),
                name: record.name.clone(),
            })?;

        stored.value = record.value.clone();
        stored.updated_at = Timestamp::now();
        stored.version += 1;
        Ok(())
    }

    async fn delete(&self, namespace: &Namespace, name: &SecretName) -> Result<(), MemoryStoreError> {
        let mut secrets = self
            .secrets
            .write()
            .map_err(|_| MemoryStoreError::LockPoisoned)?;

        secrets
            .remove(&(namespace.clone(), name.clone()))
            .map(|_| ())
            .ok_or_else(|| MemoryStoreError::NotFound {
                namespace: namespace.clone(),
                name: name.clone(),
            })
    }
}

/// Errors raised by [`InMemorySecretStore`]
#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    #[error("Secret '{name}' not found in namespace '{namespace}'")]
    NotFound {
        namespace: Namespace,
        name: SecretName,
    },

    #[error("Secret '{name}' already exists in namespace '{namespace}'")]
    AlreadyExists {
        namespace: Namespace,
        name: SecretName,
    },

    #[error("Invalid secret name: {name} - {reason}")]
    InvalidName { name: SecretName, reason: String },

    #[error("Secret value too large: {size} bytes (max: {max_size})")]
    ValueTooLarge { size: usize, max_size: usize },

    #[error("Secret map lock poisoned")]
    LockPoisoned,
}

impl StoreErrorKind for MemoryStoreError {
    fn outcome_status(&self) -> Option<OutcomeStatus> {
        match self {
            Self::NotFound { .. } => Some(OutcomeStatus::NotFound),
            Self::AlreadyExists { .. } => Some(OutcomeStatus::AlreadyExists),
            Self::InvalidName { .. } | Self::ValueTooLarge { .. } => {
                Some(OutcomeStatus::InvalidInput)
            }
            Self::LockPoisoned => None,
        }
    }
}

#[cfg(test)]
#[path = "memory_store_tests.rs"]
mod tests;
