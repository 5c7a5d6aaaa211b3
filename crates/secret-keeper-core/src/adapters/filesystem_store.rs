//! # Filesystem Secret Store Adapter
//!
//! Local filesystem implementation of [`SecretStore`] for development and
//! single-node deployments.
//!
//! Layout: `<root>/<namespace>/<name>.json`, one JSON document per secret.
//! Values are stored base64-encoded and are not encrypted.

use super::is_dns_subdomain;
use crate::classifier::{OutcomeStatus, StoreErrorKind};
use crate::namespace::Namespace;
use crate::secret::{SecretName, SecretRecord};
use crate::store::SecretStore;
use crate::Timestamp;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const DOCUMENT_EXTENSION: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretDocument {
    name: SecretName,
    namespace: Namespace,
    raw_value: String,
    created_at: Timestamp,
    updated_at: Timestamp,
}

/// Filesystem-based secret store
///
/// # Examples
///
/// ```no_run
/// use secret_keeper_core::adapters::FilesystemSecretStore;
/// use std::path::PathBuf;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FilesystemSecretStore::new(PathBuf::from("./data/secrets")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FilesystemSecretStore {
    base_path: PathBuf,
}

impl FilesystemSecretStore {
    /// Create new filesystem secret store
    ///
    /// # Errors
    ///
    /// Returns error if the base directory cannot be created.
    pub async fn new(base_path: PathBuf) -> Result<Self, FilesystemStoreError> {
        fs::create_dir_all(&base_path)
            .await
            .map_err(|e| FilesystemStoreError::io("create base directory", &base_path, e))?;

        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn namespace_dir(&self, namespace: &Namespace) -> PathBuf {
        self.base_path.join(namespace.as_str())
    }

    fn document_path(&self, namespace: &Namespace, name: &SecretName) -> PathBuf {
        self.namespace_dir(namespace)
            .join(format!("{}.{}", name.as_str(), DOCUMENT_EXTENSION))
    }

    fn temp_path(&self, namespace: &Namespace, name: &SecretName) -> PathBuf {
        self.namespace_dir(namespace)
            .join(format!(".{}.{}.tmp", name.as_str(), Uuid::new_v4()))
    }

    fn check_name(name: &SecretName) -> Result<(), FilesystemStoreError> {
        if is_dns_subdomain(name.as_str()) {
            Ok(())
        } else {
            Err(FilesystemStoreError::InvalidName {
                name: name.clone(),
                reason: "must be a lowercase DNS-1123 subdomain".to_string(),
            })
        }
    }

    /// Write a document to a fresh temp file and return its path
    async fn write_temp(&self, document: &SecretDocument) -> Result<PathBuf, FilesystemStoreError> {
        let dir = self.namespace_dir(&document.namespace);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| FilesystemStoreError::io("create namespace directory", &dir, e))?;

        let json = serde_json::to_vec_pretty(document)?;
        let temp_path = self.temp_path(&document.namespace, &document.name);

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| FilesystemStoreError::io("create temp file", &temp_path, e))?;
        file.write_all(&json)
            .await
            .map_err(|e| FilesystemStoreError::io("write secret", &temp_path, e))?;
        file.flush()
            .await
            .map_err(|e| FilesystemStoreError::io("flush secret", &temp_path, e))?;

        Ok(temp_path)
    }

    async fn read_document(&self, path: &Path) -> Result<SecretDocument, FilesystemStoreError> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| FilesystemStoreError::io("read secret", path, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Read back the raw value of a stored secret
    pub async fn read_value(
        &self,
        namespace: &Namespace,
        name: &SecretName,
    ) -> Result<Vec<u8>, FilesystemStoreError> {
        let path = self.document_path(namespace, name);
        let document = self.read_document(&path).await?;
        STANDARD.decode(document.raw_value.as_bytes()).map_err(|e| {
            FilesystemStoreError::io(
                "decode secret",
                &path,
                io::Error::new(io::ErrorKind::InvalidData, e),
            )
        })
    }
}

#[async_trait]
impl SecretStore for FilesystemSecretStore {
    type Error = FilesystemStoreError;

    async fn list(&self, namespace: &Namespace) -> Result<Vec<SecretName>, FilesystemStoreError> {
        let dir = self.namespace_dir(namespace);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FilesystemStoreError::io("list namespace", &dir, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FilesystemStoreError::io("list namespace", &dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if stem.starts_with('.') {
                continue;
            }

            if let Ok(name) = SecretName::new(stem) {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    async fn create(&self, record: &SecretRecord) -> Result<(), FilesystemStoreError> {
        Self::check_name(&record.name)?;

        let now = Timestamp::now();
        let document = SecretDocument {
            name: record.name.clone(),
            namespace: record.namespace.clone(),
            raw_value: STANDARD.encode(record.value.expose_bytes()),
            created_at: now,
            updated_at: now,
        };

        let temp_path = self.write_temp(&document).await?;
        let target = self.document_path(&record.namespace, &record.name);

        // hard_link refuses to overwrite, which makes create-if-absent atomic
        let linked = fs::hard_link(&temp_path, &target).await;
        let _ = fs::remove_file(&temp_path).await;

        linked.map_err(|e| FilesystemStoreError::io("create secret", &target, e))
    }

    async fn replace(&self, record: &SecretRecord) -> Result<(), FilesystemStoreError> {
        Self::check_name(&record.name)?;

        let target = self.document_path(&record.namespace, &record.name);
        let existing = self.read_document(&target).await?;

        let document = SecretDocument {
            name: record.name.clone(),
            namespace: record.namespace.clone(),
            raw_value: STANDARD.encode(record.value.expose_bytes()),
            created_at: existing.created_at,
            updated_at: Timestamp::now(),
        };

        let temp_path = self.write_temp(&document).await?;
        if let Err(e) = fs::rename(&temp_path, &target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(FilesystemStoreError::io("replace secret", &target, e));
        }

        Ok(())
    }

    async fn delete(
        &self,
        namespace: &Namespace,
        name: &SecretName,
    ) -> Result<(), FilesystemStoreError> {
        Self::check_name(name)?;

        let target = self.document_path(namespace, name);
        fs::remove_file(&target)
            .await
            .map_err(|e| FilesystemStoreError::io("delete secret", &target, e))
    }
}

/// Errors raised by [`FilesystemSecretStore`]
#[derive(Debug, thiserror::Error)]
pub enum FilesystemStoreError {
    #[error("Failed to {operation} at {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid secret name: {name} - {reason}")]
    InvalidName { name: SecretName, reason: String },

    #[error("Secret document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FilesystemStoreError {
    fn io(operation: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }
}

impl StoreErrorKind for FilesystemStoreError {
    fn outcome_status(&self) -> Option<OutcomeStatus> {
        match self {
            Self::Io { source, .. } => source.outcome_status(),
            Self::InvalidName { .. } => Some(OutcomeStatus::InvalidInput),
            Self::Serialization(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "filesystem_store_tests.rs"]
mod tests;
