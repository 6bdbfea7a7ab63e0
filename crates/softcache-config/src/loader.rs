//! Credentials loader with layered sources.

use crate::{CacheCredentials, ConfigValidator};
use config::{Config, ConfigError, Environment, File};
use softcache_core::SoftcacheError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Prefix of the environment variables read by the loader.
pub const ENV_PREFIX: &str = "REDIS";

/// Default location of the optional credentials file.
pub const DEFAULT_CONFIG_FILE: &str = "config/cache.toml";

/// Loads [`CacheCredentials`] once at startup.
///
/// Sources, lowest to highest precedence:
/// 1. Built-in defaults
/// 2. The optional TOML file (`config/cache.toml` unless overridden)
/// 3. A `.env` file, merged into the process environment
/// 4. `REDIS_*` environment variables
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_file: PathBuf,
    env: Option<config::Map<String, String>>,
    load_dotenv: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            env: None,
            load_dotenv: true,
        }
    }
}

impl ConfigLoader {
    /// Creates a loader reading the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the credentials file from another path.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = path.into();
        self
    }

    /// Reads variables from `vars` instead of the process environment.
    ///
    /// Also skips the `.env` file.
    #[must_use]
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self.load_dotenv = false;
        self
    }

    /// Loads and validates the credentials.
    ///
    /// Validation problems are logged, not returned: a bad store address
    /// surfaces later as a failed connection, which the cache already
    /// treats as a miss.
    pub fn load(&self) -> Result<CacheCredentials, SoftcacheError> {
        if self.load_dotenv {
            if let Err(e) = dotenvy::dotenv() {
                debug!("No .env file found or error loading it: {}", e);
            }
        }

        let mut builder = Config::builder();

        if Path::new(&self.config_file).exists() {
            debug!("Loading cache config from: {}", self.config_file.display());
            builder = builder.add_source(File::from(self.config_file.as_path()).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .ignore_empty(true)
                .source(self.env.clone()),
        );

        let credentials: CacheCredentials = builder
            .build()
            .and_then(|config| config.try_deserialize::<CacheCredentials>())
            .map_err(config_error_to_softcache_error)?;

        if let Err(errors) = ConfigValidator::validate(&credentials) {
            for error in &errors {
                warn!(error = %error, "Invalid cache configuration");
            }
        }

        info!(
            addr = %credentials.addr(),
            cluster = credentials.is_cluster,
            ignore = credentials.ignore,
            request_timeout_ms = credentials.request_timeout_ms,
            "Cache configuration loaded"
        );

        Ok(credentials)
    }
}

fn config_error_to_softcache_error(err: ConfigError) -> SoftcacheError {
    SoftcacheError::Configuration(err.to_string())
}
