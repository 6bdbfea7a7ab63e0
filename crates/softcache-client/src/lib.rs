//! # Softcache Client
//!
//! Fail-soft access to an external key-value store. Every facade call
//! returns a value or `None`; store outages, slow replies and bad
//! configuration all look like a cache miss to the caller.
//!
//! Layers, leaves first:
//! - [`handle`]: the store seam ([`StoreHandle`], [`Connector`]).
//! - [`manager`]: the lazily built, single connection handle.
//! - [`redis_store`]: the Redis transport, single node or cluster.
//! - [`cache`]: the public `get`/`set`/`delete` facade.

pub mod cache;
pub mod codec;
pub mod handle;
pub mod manager;
pub mod options;
pub mod redis_store;

pub use cache::{Cache, DEFAULT_TTL_SECS};
pub use codec::{Codec, JsonCodec};
pub use handle::{Connector, HandleEvent, HandleStatus, StoreHandle};
pub use manager::{ConnectionManager, HandleEvents, Lease};
pub use options::{ClusterOptions, NodeOptions, ReadFrom, ResolvedOptions, Topology};
pub use redis_store::RedisConnector;
