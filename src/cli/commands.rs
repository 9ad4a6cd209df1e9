//! CLI command implementations
//!
//! `serve` boots the service in a fixed order: configuration, logging,
//! runtime, store (opened and bootstrapped), authenticator, admission
//! control, HTTP server. Any failure before the listener is bound aborts
//! the process.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::admission::Admission;
use crate::auth::StaticTokenAuthenticator;
use crate::http_server::{AppState, HttpServer};
use crate::observability::{init_logging, DEFAULT_FILTER};
use crate::store::{CoinStore, SqliteStorage};

use super::args::{Command, ConfigOverrides};
use super::config::Config;
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, overrides } => serve(config.as_deref(), &overrides),
        Command::CheckConfig { config } => check_config(&config),
    }
}

/// Resolves the effective configuration: file (or defaults), then
/// overrides, then validation.
pub fn resolve_config(config_path: Option<&Path>, overrides: &ConfigOverrides) -> CliResult<Config> {
    let mut config = match config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply(overrides);
    config.validate()?;
    Ok(config)
}

/// Start the API server and block until it shuts down
pub fn serve(config_path: Option<&Path>, overrides: &ConfigOverrides) -> CliResult<()> {
    let config = resolve_config(config_path, overrides)?;

    if let Err(e) = init_logging(config.server.log_format, DEFAULT_FILTER) {
        eprintln!("{}", e);
    }

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(serve_async(config))
}

async fn serve_async(config: Config) -> CliResult<()> {
    let storage = SqliteStorage::open(&config.store)?;
    let store = CoinStore::new(Arc::new(storage), config.store.query_timeout());
    store.bootstrap().await?;
    info!(path = %config.store.path, "store opened");

    let authenticator = StaticTokenAuthenticator::from_config(&config.auth)
        .map_err(|e| CliError::config_error(e.to_string()))?;
    if authenticator.is_empty() {
        warn!("no API tokens configured; every coin endpoint will answer 401");
    }

    let admission = Admission::from_config(&config.limiter)
        .map_err(|e| CliError::config_error(e.to_string()))?;
    info!(
        enabled = admission.is_enabled(),
        rps = config.limiter.rps,
        burst = config.limiter.burst,
        "rate limiter configured"
    );

    let state = AppState::new(store, Arc::new(authenticator), config.server.env);
    let server = HttpServer::new(config.server, state, admission);

    server
        .start()
        .await
        .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
}

/// Load and validate a configuration file, printing a one-line summary
pub fn check_config(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    config.validate()?;
    println!(
        "config OK: listen {} env {} store {} limiter {} tokens {}",
        config.server.socket_addr(),
        config.server.env,
        config.store.path,
        if config.limiter.enabled { "on" } else { "off" },
        config.auth.tokens.len(),
    );
    Ok(())
}
