//! `softcache` binary entry point.

use clap::Parser;
use softcache_cli::{run, Cli};
use softcache_core::telemetry::{init_logging, LoggingConfig};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        json: cli.json_logs,
        ..LoggingConfig::default()
    };
    if let Err(e) = init_logging(&logging) {
        eprintln!("{}", e);
    }

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}
