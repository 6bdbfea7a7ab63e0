//! Cache credentials.

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Default store port.
pub const DEFAULT_PORT: u16 = 6379;

/// Default per-call deadline in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 300;

/// Default connect deadline in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 200;

/// Connection settings for the external store.
///
/// Loaded once and shared immutably for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheCredentials {
    /// Store host.
    #[serde(deserialize_with = "host_or_default")]
    pub host: String,

    /// Store port.
    #[serde(deserialize_with = "port_or_default")]
    pub port: u16,

    /// Prefix prepended to every key.
    #[serde(rename = "prefix", deserialize_with = "non_empty")]
    pub key_prefix: Option<String>,

    /// Store password.
    #[serde(deserialize_with = "non_empty", skip_serializing)]
    pub password: Option<String>,

    /// Address the store as a cluster.
    #[serde(rename = "cluster", deserialize_with = "exact_true")]
    pub is_cluster: bool,

    /// Deadline for a single store call, in milliseconds.
    #[serde(rename = "request_timeout", deserialize_with = "request_timeout_or_default")]
    pub request_timeout_ms: u64,

    /// Connect deadline, in milliseconds.
    #[serde(rename = "connect_timeout", deserialize_with = "connect_timeout_or_default")]
    pub connect_timeout_ms: u64,

    /// Disable caching entirely.
    #[serde(deserialize_with = "exact_true")]
    pub ignore: bool,
}

impl Default for CacheCredentials {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            key_prefix: None,
            password: None,
            is_cluster: false,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            ignore: false,
        }
    }
}

impl CacheCredentials {
    /// Credentials with caching switched off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            ignore: true,
            ..Self::default()
        }
    }

    /// Returns the per-call deadline as a Duration.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Returns the configured connect deadline as a Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns `host:port`.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Raw scalar as it arrives from env vars, TOML or JSON.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Positive integer value, if any.
    fn positive(&self) -> Option<u64> {
        match self {
            Self::Int(i) if *i > 0 => u64::try_from(*i).ok(),
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Self::Float(f) if f.is_finite() && *f >= 1.0 => Some(*f as u64),
            Self::Str(s) => s.trim().parse::<u64>().ok().filter(|v| *v > 0),
            _ => None,
        }
    }
}

fn positive_or<'de, D>(deserializer: D, default: u64) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Scalar>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.positive()).unwrap_or(default))
}

fn port_or_default<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let port = positive_or(deserializer, u64::from(DEFAULT_PORT))?;
    Ok(u16::try_from(port).unwrap_or(DEFAULT_PORT))
}

fn request_timeout_or_default<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    positive_or(deserializer, DEFAULT_REQUEST_TIMEOUT_MS)
}

fn connect_timeout_or_default<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    positive_or(deserializer, DEFAULT_CONNECT_TIMEOUT_MS)
}

/// Only the literal `true` (or a boolean true) enables a flag.
fn exact_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Bool(b)) => b,
        Some(Scalar::Str(s)) => s == "true",
        _ => false,
    })
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Str(s)) if !s.is_empty() => Some(s),
        Some(Scalar::Int(i)) => Some(i.to_string()),
        _ => None,
    })
}

fn host_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(non_empty(deserializer)?.unwrap_or_else(|| CacheCredentials::default().host))
}
