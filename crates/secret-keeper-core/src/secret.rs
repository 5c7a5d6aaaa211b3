//! # Secret Module
//!
//! Secret records, their identifiers and the wire forms used to decode
//! requests and encode listings.
//!
//! A record's namespace is never taken from the wire payload: the payload is
//! turned into a [`SecretRecord`] only together with a [`ResolvedNamespace`].

use crate::namespace::{Namespace, ResolvedNamespace};
use crate::ValidationError;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use zeroize::Zeroizing;

/// Maximum secret name length (DNS subdomain limit)
pub const MAX_SECRET_NAME_LENGTH: usize = 253;

// ============================================================================
// Core Types
// ============================================================================

/// Secret identifier, unique within a namespace
///
/// Only structural rules are enforced here. Backend naming rules (for
/// example DNS-1123 subdomains) are the store's concern and surface as
/// `InvalidInput` outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecretName(String);

impl SecretName {
    /// Create new secret name with validation
    ///
    /// # Validation Rules
    /// - Must be 1-253 characters
    /// - Must not contain whitespace or control characters
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            });
        }

        if name.len() > MAX_SECRET_NAME_LENGTH {
            return Err(ValidationError::TooLong {
                field: "name".to_string(),
                max_length: MAX_SECRET_NAME_LENGTH,
            });
        }

        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError::InvalidCharacters {
                field: "name".to_string(),
                invalid_chars: "whitespace or control characters".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SecretName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SecretName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SecretName> for String {
    fn from(value: SecretName) -> Self {
        value.0
    }
}

/// Secure container for secret values
///
/// The content is opaque to this crate. It is zeroized when dropped and is
/// never included in Debug output or logs.
#[derive(Clone, Default)]
pub struct SecretValue {
    inner: Zeroizing<Vec<u8>>,
}

impl SecretValue {
    /// Create secret value from string
    pub fn from_string(value: String) -> Self {
        Self {
            inner: Zeroizing::new(value.into_bytes()),
        }
    }

    /// Create secret value from bytes
    pub fn from_bytes(value: Vec<u8>) -> Self {
        Self {
            inner: Zeroizing::new(value),
        }
    }

    /// Get secret as bytes (only for immediate use)
    pub fn expose_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Get secret as UTF-8 text, if it is valid UTF-8
    pub fn expose_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.inner).ok()
    }

    /// Check if secret is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get secret length without exposing content
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretValue")
            .field("length", &self.len())
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for SecretValue {
    fn eq(&self, other: &Self) -> bool {
        self.expose_bytes() == other.expose_bytes()
    }
}

impl Eq for SecretValue {}

/// A secret bound to exactly one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRecord {
    pub name: SecretName,
    pub namespace: Namespace,
    pub value: SecretValue,
}

impl SecretRecord {
    pub fn new(name: SecretName, namespace: Namespace, value: SecretValue) -> Self {
        Self {
            name,
            namespace,
            value,
        }
    }

    /// Listing form of this record, without its value
    pub fn summary(&self) -> SecretSummary {
        SecretSummary::new(&self.name, &self.namespace)
    }
}

// ============================================================================
// Wire Types
// ============================================================================

/// Decoded request body for create, replace and delete
///
/// `namespace` is carried only so callers can inspect what was declared; it
/// never reaches the store.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretPayload {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub value: Option<String>,

    /// Base64-encoded binary content; takes precedence over `value`
    #[serde(default)]
    pub raw_value: Option<String>,
}

impl SecretPayload {
    /// Decode a request body
    ///
    /// # Errors
    /// - `DecodeError::EmptyBody` - No body was sent
    /// - `DecodeError::InvalidJson` - Body is not a JSON secret object
    pub fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(DecodeError::EmptyBody);
        }

        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(body)
            .map_err(|e| DecodeError::InvalidJson {
                message: e.to_string(),
            })?;

        serde_json::from_value(serde_json::Value::Object(object)).map_err(|e| {
            DecodeError::InvalidJson {
                message: e.to_string(),
            }
        })
    }

    /// Validated secret name
    pub fn secret_name(&self) -> Result<SecretName, DecodeError> {
        SecretName::new(self.name.clone()).map_err(DecodeError::InvalidName)
    }

    /// Build the record to store, bound to the resolved namespace
    ///
    /// Any namespace declared in the payload is discarded.
    pub fn into_record(self, namespace: &ResolvedNamespace) -> Result<SecretRecord, DecodeError> {
        let name = self.secret_name()?;

        let value = match (self.raw_value, self.value) {
            (Some(raw), _) => {
                let bytes = STANDARD
                    .decode(raw.as_bytes())
                    .map_err(|e| DecodeError::InvalidRawValue {
                        message: e.to_string(),
                    })?;
                SecretValue::from_bytes(bytes)
            }
            (None, Some(text)) => SecretValue::from_string(text),
            (None, None) => SecretValue::default(),
        };

        Ok(SecretRecord::new(
            name,
            namespace.namespace().clone(),
            value,
        ))
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretPayload")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("value", &self.value.as_ref().map(|_| "[REDACTED]"))
            .field("raw_value", &self.raw_value.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Listing entry returned for read requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretSummary {
    pub name: String,
    pub namespace: String,
}

impl SecretSummary {
    pub fn new(name: &SecretName, namespace: &Namespace) -> Self {
        Self {
            name: name.as_str().to_string(),
            namespace: namespace.as_str().to_string(),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors decoding a secret request body
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Request body is empty")]
    EmptyBody,

    #[error("Request body is not a valid secret: {message}")]
    InvalidJson { message: String },

    #[error("Invalid secret name: {0}")]
    InvalidName(ValidationError),

    #[error("rawValue is not valid base64: {message}")]
    InvalidRawValue { message: String },
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;
