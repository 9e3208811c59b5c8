//! Xinjie application binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Initialize logging
//! 3. Open the response store (SQLite or PostgreSQL) and run migrations
//! 4. Build the interpretation client
//! 5. Start the axum REST API server

mod cli;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use xinjie_api::routes;
use xinjie_api::state::AppState;
use xinjie_core::config::XinjieConfig;
use xinjie_interpret::{HttpInterpreter, Interpreter, MockInterpreter};

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config_found = config_file.exists();
    let mut config = if config_found {
        XinjieConfig::load(&config_file)?
    } else {
        XinjieConfig::default()
    };
    args.apply(&mut config)?;

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Xinjie v{}", env!("CARGO_PKG_VERSION"));
    if config_found {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::info!(path = %config_file.display(), "No config file, using defaults");
    }

    // Storage.
    let store = match xinjie_storage::open_store(&config.storage).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(backend = %config.storage.backend, error = %e, "Failed to open response store");
            return Err(e.into());
        }
    };

    // Upstream.
    let interpreter: Arc<dyn Interpreter> = if args.mock_upstream {
        tracing::warn!("Using mock interpreter, upstream API will not be called");
        Arc::new(MockInterpreter::new())
    } else {
        let client = HttpInterpreter::new(&config.upstream)?;
        tracing::info!(endpoint = %client.endpoint(), "Interpretation client ready");
        Arc::new(client)
    };

    // === API server ===

    let state = AppState::new(&config, store, interpreter);
    tracing::info!(
        "Open http://{}:{}/responses to browse history",
        config.general.bind,
        config.general.port
    );

    routes::start_server(&config, state).await?;

    Ok(())
}
