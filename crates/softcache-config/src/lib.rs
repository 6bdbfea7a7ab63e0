//! # Softcache Config
//!
//! Cache credentials, read once at startup from defaults, an optional
//! TOML file, a `.env` file and `REDIS_*` environment variables.

mod credentials;
mod loader;
mod validation;

pub use credentials::*;
pub use loader::*;
pub use validation::*;
