//! # Softcache CLI
//!
//! Runs one facade operation against the configured store and prints the
//! result as JSON. A miss prints `null` and still exits successfully.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Command};
pub use commands::{run, wait_ready};
