//! Logging initialisation for Softcache binaries.
//!
//! Library code only emits `tracing` events; installing a subscriber is
//! left to the binary that embeds the cache.

#[cfg(feature = "telemetry")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::SoftcacheResult;
use serde::{Deserialize, Serialize};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_filter")]
    pub default_filter: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,

    /// Include the event target in each line.
    #[serde(default = "default_with_target")]
    pub with_target: bool,
}

fn default_filter() -> String {
    "info,softcache=debug".to_string()
}

fn default_with_target() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_filter: default_filter(),
            json: false,
            with_target: default_with_target(),
        }
    }
}

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// Fails if a subscriber is already installed.
#[cfg(feature = "telemetry")]
pub fn init_logging(config: &LoggingConfig) -> SoftcacheResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(config.with_target),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(config.with_target),
            )
            .try_init()
    };

    result.map_err(|e| crate::SoftcacheError::Internal(format!("Failed to install subscriber: {}", e)))?;

    tracing::debug!(json = config.json, "Logging initialized");
    Ok(())
}

/// Placeholder for when the telemetry feature is disabled.
#[cfg(not(feature = "telemetry"))]
pub fn init_logging(_config: &LoggingConfig) -> SoftcacheResult<()> {
    Ok(())
}
