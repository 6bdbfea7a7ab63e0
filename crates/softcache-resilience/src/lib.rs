//! # Softcache Resilience
//!
//! Deadline racing for store calls. A single race per call; retries are
//! left to the caller.

pub mod timeout;

pub use timeout::*;
