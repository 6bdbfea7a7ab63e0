//! Command-line arguments.

use clap::{Parser, Subcommand};
use softcache_client::DEFAULT_TTL_SECS;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "softcache", about = "Fail-soft cache client", version)]
pub struct Cli {
    /// TOML file read beneath the REDIS_* variables
    #[arg(short, long, env = "SOFTCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit JSON log lines on stderr
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Read a key
    Get {
        /// The cache key
        key: String,
    },
    /// Write a key
    Set {
        /// The cache key
        key: String,
        /// JSON value; anything that is not JSON is stored as a string
        value: String,
        /// TTL in seconds
        #[arg(short, long, default_value_t = DEFAULT_TTL_SECS)]
        ttl: u64,
    },
    /// Delete a key
    Del {
        /// The cache key
        key: String,
    },
    /// Show configuration and connection state
    Status,
}
