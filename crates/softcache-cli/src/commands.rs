//! Command execution.

use crate::cli::{Cli, Command};
use serde_json::{json, Value};
use softcache_client::{Cache, HandleStatus};
use softcache_config::ConfigLoader;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs the parsed command and prints its JSON result on stdout.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = cli.config {
        loader = loader.with_file(path);
    }
    let credentials = loader.load()?;
    let connect_timeout = credentials.connect_timeout();
    let cache = Cache::with_redis(credentials);

    let status = wait_ready(&cache, connect_timeout).await;
    debug!(status = ?status, "Connection state before command");

    let output = match cli.command {
        Command::Get { key } => json!(cache.get::<Value>(&key).await),
        Command::Set { key, value, ttl } => {
            let value = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
            json!(cache.set_with_ttl(&key, &value, ttl).await)
        }
        Command::Del { key } => json!(cache.delete(&key).await),
        Command::Status => {
            let credentials = cache.manager().credentials();
            json!({
                "addr": credentials.addr(),
                "cluster": credentials.is_cluster,
                "ignored": credentials.ignore,
                "status": status.map(|s| s.to_string()),
                "generation": cache.manager().generation(),
            })
        }
    };

    println!("{}", serde_json::to_string(&output)?);
    cache.disconnect();
    info!("Done");
    Ok(())
}

/// Builds the handle and waits up to `timeout` for it to become ready.
///
/// Polls the one handle it built, so a failed connect is reported rather
/// than rebuilt. Returns `None` when no handle could be built, otherwise
/// the last status seen: `Ready`, a terminal status, or whatever it was at
/// the deadline.
pub async fn wait_ready(cache: &Cache, timeout: Duration) -> Option<HandleStatus> {
    let lease = cache.manager().get_instance()?;
    let deadline = Instant::now() + timeout;
    loop {
        let status = lease.status();
        if status == HandleStatus::Ready || status.is_terminal() || Instant::now() >= deadline {
            return Some(status);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
