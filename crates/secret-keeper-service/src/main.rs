//! # Secret-Keeper Service
//!
//! Binary entry point for the Secret-Keeper HTTP service.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes logging
//! - Creates the secret store, namespace resolver and handler
//! - Starts the HTTP server from secret-keeper-api

mod bootstrap;

use clap::Parser;
use secret_keeper_api::{start_server, ServiceConfig, ServiceError};
use std::path::PathBuf;
use tracing::{error, info};

/// Secret-Keeper - namespace-scoped secret management
#[derive(Parser, Debug)]
#[command(name = "secret-keeper")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Namespace-scoped secret management service")]
struct Args {
    /// Configuration file path, applied after the default locations
    #[arg(short, long, env = "SK_CONFIG_FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (later sources override earlier ones):
    //  1. /etc/secret-keeper/service.yaml
    //  2. ./config/service.yaml
    //  3. --config / SK_CONFIG_FILE (must exist when given)
    //  4. Environment variables prefixed SK__, e.g. SK__SERVER__PORT=9090
    //
    // Logging is not configured yet, so failures go to stderr.
    // -------------------------------------------------------------------------
    let service_config = match ServiceConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("secret-keeper: configuration error: {e}");
            std::process::exit(3);
        }
    };

    bootstrap::init_logging(&service_config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config_file = ?args.config,
        "Starting Secret-Keeper Service"
    );

    let handler = match bootstrap::build_handler(&service_config.secrets).await {
        Ok(handler) => handler,
        Err(e) => {
            error!(error = %e, "Failed to initialize secret handling; aborting");
            std::process::exit(exit_code(&e));
        }
    };

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        endpoint = %service_config.server.endpoint_path,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(service_config, handler).await {
        error!("Server failed: {}", e);
        std::process::exit(exit_code(&e));
    }

    Ok(())
}

fn exit_code(error: &ServiceError) -> i32 {
    match error {
        ServiceError::BindFailed { .. } => 1,
        ServiceError::ServerFailed { .. } => 2,
        ServiceError::Configuration(_) => 3,
        ServiceError::StoreInitialization { .. } => 4,
    }
}
