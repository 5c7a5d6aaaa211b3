//! # Infrastructure Adapters
//!
//! Secret store implementations.

use regex::Regex;
use std::sync::LazyLock;

pub mod filesystem_store;
pub mod memory_store;

pub use filesystem_store::{FilesystemSecretStore, FilesystemStoreError};
pub use memory_store::{InMemorySecretStore, MemoryStoreError};

static SUBDOMAIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("subdomain pattern is a valid regex")
});

/// DNS-1123 subdomain check used by the bundled stores for secret names
pub(crate) fn is_dns_subdomain(value: &str) -> bool {
    value.len() <= 253 && SUBDOMAIN_PATTERN.is_match(value)
}
