//! # Softcache Core
//!
//! Core error types and logging setup shared by every Softcache crate.
//! The cache facade never lets these errors escape to application code;
//! they exist so the inner layers can classify failures before the facade
//! degrades them to a miss.

pub mod error;
pub mod result;
pub mod telemetry;

pub use error::*;
pub use result::*;
