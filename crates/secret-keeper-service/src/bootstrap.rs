//! Wiring from configuration to a ready [`SecretsHandler`].

use secret_keeper_api::{LoggingConfig, SecretsConfig, ServiceError, StoreConfig};
use secret_keeper_core::{
    DefaultNamespaceResolver, FilesystemSecretStore, InMemorySecretStore, KindClassifier,
    SecretsHandler, StaticNamespaceAuthorizer,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "secret_keeper_service={level},secret_keeper_api={level},secret_keeper_core={level},tower_http=info",
            level = config.level
        ))
    })?;

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_format {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }

    Ok(())
}

/// Build the secrets handler for the configured store and namespaces
pub async fn build_handler(config: &SecretsConfig) -> Result<SecretsHandler, ServiceError> {
    let default_namespace = config.default_namespace()?;
    let allowed = config.allowed_namespaces()?;

    let authorizer = StaticNamespaceAuthorizer::new(default_namespace.clone(), allowed);
    info!(
        default_namespace = %default_namespace,
        allowed = authorizer.allowed_namespaces().count(),
        "Configured namespace authorizer"
    );

    let resolver = Arc::new(DefaultNamespaceResolver::new(
        default_namespace,
        Arc::new(authorizer),
    ));

    let handler = match &config.store {
        StoreConfig::Memory => {
            info!("Using in-memory secret store; secrets are lost on restart");
            SecretsHandler::with_store(resolver, InMemorySecretStore::new(), KindClassifier)
        }
        StoreConfig::Filesystem { root } => {
            let store = FilesystemSecretStore::new(root.clone())
                .await
                .map_err(|e| ServiceError::StoreInitialization {
                    message: e.to_string(),
                })?;
            info!(root = %root.display(), "Using filesystem secret store");
            SecretsHandler::with_store(resolver, store, KindClassifier)
        }
    };

    Ok(handler)
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
