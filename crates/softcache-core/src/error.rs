//! Unified error types for all Softcache layers.

use thiserror::Error;

/// Message carried by a timeout raised on a store call.
///
/// The facade treats a failure with exactly this message as transient and
/// keeps the connection; every other failure discards it.
pub const TIMEOUT_MESSAGE: &str = "ERR_TIMEOUT";

/// Unified error type for Softcache.
#[derive(Error, Debug)]
pub enum SoftcacheError {
    // ============ Configuration Errors ============
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Store Errors ============
    /// The connection to the store could not be built or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// The store rejected or failed a command
    #[error("Store error: {0}")]
    Store(String),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ============ Resilience Errors ============
    /// Timeout error, carrying the caller-supplied message
    #[error("Operation timed out: {0}")]
    Timeout(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SoftcacheError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::Store(_) => "STORE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the bare message without the variant prefix.
    ///
    /// For a timeout this is exactly the message handed to the timeout
    /// primitive, which is what failure classification compares against.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Configuration(m)
            | Self::Connection(m)
            | Self::Store(m)
            | Self::Serialization(m)
            | Self::Timeout(m)
            | Self::Internal(m) => m.clone(),
            Self::Other(e) => e.to_string(),
        }
    }

    /// Checks if this failure should leave the connection in place.
    ///
    /// Classification is by message alone: any failure whose message is
    /// exactly [`TIMEOUT_MESSAGE`] is transient.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.message() == TIMEOUT_MESSAGE
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection<T: Into<String>>(message: T) -> Self {
        Self::Connection(message.into())
    }

    /// Creates a store error.
    #[must_use]
    pub fn store<T: Into<String>>(message: T) -> Self {
        Self::Store(message.into())
    }

    /// Creates a timeout error with the given message.
    #[must_use]
    pub fn timeout<T: Into<String>>(message: T) -> Self {
        Self::Timeout(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }
}

impl From<serde_json::Error> for SoftcacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON serialization error: {}", err))
    }
}
