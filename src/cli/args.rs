//! CLI argument definitions using clap
//!
//! Commands:
//! - coinvault serve [--config <path>] [overrides...]
//! - coinvault check-config --config <path>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// coinvault - JSON API for a rare coin catalogue
#[derive(Parser, Debug)]
#[command(name = "coinvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the API server
    Serve {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Load and validate a configuration file, then exit
    CheckConfig {
        /// Path to configuration file
        #[arg(long)]
        config: PathBuf,
    },
}

/// Command-line values that take precedence over the config file
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    /// API server port
    #[arg(long)]
    pub port: Option<u16>,

    /// SQLite database path (`:memory:` for a throwaway store)
    #[arg(long)]
    pub db: Option<String>,

    /// Enable or disable per-client rate limiting
    #[arg(long)]
    pub limiter_enabled: Option<bool>,

    /// Sustained requests per second per client
    #[arg(long)]
    pub limiter_rps: Option<f64>,

    /// Burst size per client
    #[arg(long)]
    pub limiter_burst: Option<u32>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
