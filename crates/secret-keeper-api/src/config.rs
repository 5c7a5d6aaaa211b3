//! Configuration types for the HTTP service

use crate::errors::ConfigError;
use secret_keeper_core::Namespace;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for configuration overrides (`SK__SERVER__PORT`)
pub const ENV_PREFIX: &str = "SK";

/// System-wide configuration file, without extension
pub const SYSTEM_CONFIG_PATH: &str = "/etc/secret-keeper/service";

/// Deployment-local configuration file, without extension
pub const LOCAL_CONFIG_PATH: &str = "config/service";

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Namespace and store settings
    pub secrets: SecretsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from layered sources
    ///
    /// Later sources override earlier ones:
    /// 1. `/etc/secret-keeper/service.yaml`
    /// 2. `config/service.yaml`
    /// 3. `explicit_path`, which must exist when given
    /// 4. `SK__`-prefixed environment variables
    ///
    /// Missing optional files are skipped, so an unconfigured environment
    /// yields the built-in defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(
                config::File::with_name(SYSTEM_CONFIG_PATH)
                    .required(false)
                    .format(config::FileFormat::Yaml),
            )
            .add_source(
                config::File::with_name(LOCAL_CONFIG_PATH)
                    .required(false)
                    .format(config::FileFormat::Yaml),
            );

        if let Some(path) = explicit_path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("secrets.allowed_namespaces")
                    .try_parsing(true),
            )
            .build()?;

        let service_config: ServiceConfig = config.try_deserialize()?;
        service_config.validate()?;
        Ok(service_config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "must be non-zero"));
        }

        if self.server.endpoint_path.is_empty() || !self.server.endpoint_path.starts_with('/') {
            return Err(ConfigError::invalid(
                "server.endpoint_path",
                "must be a non-empty path starting with '/'",
            ));
        }

        if self.server.max_body_size == 0 {
            return Err(ConfigError::invalid("server.max_body_size", "must be non-zero"));
        }

        self.secrets.default_namespace()?;
        self.secrets.allowed_namespaces()?;

        if let StoreConfig::Filesystem { root } = &self.secrets.store {
            if root.as_os_str().is_empty() {
                return Err(ConfigError::invalid(
                    "secrets.store.root",
                    "filesystem store requires a root directory",
                ));
            }
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Path the secrets endpoint is mounted on
    pub endpoint_path: String,

    /// Maximum request size in bytes
    pub max_body_size: usize,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            endpoint_path: "/system/secrets".to_string(),
            max_body_size: 1024 * 1024, // 1MB
            shutdown_timeout_seconds: 30,
            enable_cors: false,
        }
    }
}

/// Namespace and secret store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// Namespace used when a request declares none
    pub default_namespace: String,

    /// Additional namespaces secrets may be managed in
    pub allowed_namespaces: Vec<String>,

    /// Backing store
    pub store: StoreConfig,
}

impl SecretsConfig {
    /// Validated default namespace
    pub fn default_namespace(&self) -> Result<Namespace, ConfigError> {
        Namespace::new(self.default_namespace.clone())
            .map_err(|e| ConfigError::invalid("secrets.default_namespace", e.to_string()))
    }

    /// Validated allow-list
    pub fn allowed_namespaces(&self) -> Result<Vec<Namespace>, ConfigError> {
        self.allowed_namespaces
            .iter()
            .map(|ns| {
                Namespace::new(ns.clone())
                    .map_err(|e| ConfigError::invalid("secrets.allowed_namespaces", e.to_string()))
            })
            .collect()
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            default_namespace: "openfaas-fn".to_string(),
            allowed_namespaces: vec![],
            store: StoreConfig::default(),
        }
    }
}

/// Secret store backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Process-local store; contents are lost on restart
    #[default]
    Memory,

    /// One JSON document per secret below `root`
    Filesystem { root: PathBuf },
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
