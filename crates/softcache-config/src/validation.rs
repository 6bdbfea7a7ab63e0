//! Credentials validation.
//!
//! Collects every problem at once so operators see the whole picture in a
//! single startup log.

use crate::CacheCredentials;
use std::fmt;

/// Credentials validation error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// Host is empty while caching is enabled.
    MissingHost,
    /// Port number is invalid (must be 1-65535).
    InvalidPort { value: u16 },
    /// Timeout value must be positive.
    NonPositiveTimeout { name: String },
    /// Key prefix contains whitespace, which splits the key on the wire.
    InvalidKeyPrefix { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHost => write!(f, "Store host is required when caching is enabled"),
            Self::InvalidPort { value } => {
                write!(f, "Invalid store port: {} (must be 1-65535)", value)
            }
            Self::NonPositiveTimeout { name } => {
                write!(f, "Timeout '{}' must be positive", name)
            }
            Self::InvalidKeyPrefix { value } => {
                write!(f, "Key prefix '{}' must not contain whitespace", value)
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Credentials validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the credentials.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    /// Disabled credentials are always valid.
    pub fn validate(credentials: &CacheCredentials) -> Result<(), Vec<ConfigValidationError>> {
        if credentials.ignore {
            return Ok(());
        }

        let mut errors = Vec::new();

        if credentials.host.trim().is_empty() {
            errors.push(ConfigValidationError::MissingHost);
        }

        if credentials.port == 0 {
            errors.push(ConfigValidationError::InvalidPort { value: 0 });
        }

        if credentials.request_timeout_ms == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "request_timeout_ms".to_string(),
            });
        }
        if credentials.connect_timeout_ms == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "connect_timeout_ms".to_string(),
            });
        }

        if let Some(prefix) = &credentials.key_prefix {
            if prefix.chars().any(char::is_whitespace) {
                errors.push(ConfigValidationError::InvalidKeyPrefix { value: prefix.clone() });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
