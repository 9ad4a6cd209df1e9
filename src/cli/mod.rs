//! CLI module for coinvault
//!
//! Provides command-line interface for:
//! - serve: load configuration and run the API server
//! - check-config: validate a configuration file and exit

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command, ConfigOverrides};
pub use commands::{check_config, resolve_config, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
