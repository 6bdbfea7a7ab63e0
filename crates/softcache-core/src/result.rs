//! Result type aliases for Softcache.

use crate::SoftcacheError;

/// A specialized `Result` type for Softcache operations.
pub type SoftcacheResult<T> = Result<T, SoftcacheError>;
