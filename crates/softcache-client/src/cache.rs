//! Cache facade: `get`, `set` and `delete` that never fail.

use crate::codec::{Codec, JsonCodec};
use crate::handle::{Connector, HandleStatus};
use crate::manager::{ConnectionManager, Lease};
use crate::redis_store::RedisConnector;
use serde::de::DeserializeOwned;
use serde::Serialize;
use softcache_config::{CacheCredentials, ConfigLoader};
use softcache_core::{SoftcacheError, SoftcacheResult, TIMEOUT_MESSAGE};
use softcache_resilience::with_timeout;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Default time-to-live for cached values (2 hours).
pub const DEFAULT_TTL_SECS: u64 = 7200;

static SHARED: OnceLock<Cache> = OnceLock::new();

/// Fail-soft cache facade.
///
/// Every operation returns `None` instead of failing: when caching is
/// disabled, when no connection can be built, when the connection is not
/// ready, when the call exceeds the request timeout, and when the store
/// returns an error. A timeout keeps the connection; any other failure
/// discards it so the next call reconnects.
pub struct Cache<C: Codec = JsonCodec> {
    manager: ConnectionManager,
    codec: C,
}

impl Cache<JsonCodec> {
    /// Creates a JSON cache over the given connector.
    pub fn new(credentials: CacheCredentials, connector: Arc<dyn Connector>) -> Self {
        Self::with_codec(credentials, connector, JsonCodec)
    }

    /// Creates a JSON cache backed by Redis.
    #[must_use]
    pub fn with_redis(credentials: CacheCredentials) -> Self {
        Self::new(credentials, Arc::new(RedisConnector::new()))
    }

    /// Process-wide cache built from `REDIS_*` configuration on first use.
    ///
    /// If the configuration cannot be loaded, caching is disabled.
    pub fn shared() -> &'static Self {
        SHARED.get_or_init(|| {
            let credentials = ConfigLoader::new().load().unwrap_or_else(|e| {
                warn!(error = %e, "Cache configuration unavailable, caching disabled");
                CacheCredentials::disabled()
            });
            Self::with_redis(credentials)
        })
    }
}

impl<C: Codec> Cache<C> {
    /// Creates a cache with a custom codec.
    pub fn with_codec(credentials: CacheCredentials, connector: Arc<dyn Connector>, codec: C) -> Self {
        Self {
            manager: ConnectionManager::new(Arc::new(credentials), connector),
            codec,
        }
    }

    /// The underlying connection manager.
    #[must_use]
    pub const fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Whether caching is switched off by configuration.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.manager.credentials().ignore
    }

    /// Reads `key`. `None` means not cached or not available.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let lease = self.ready_lease()?;

        let outcome = with_timeout(self.manager.request_timeout(), TIMEOUT_MESSAGE, || {
            lease.handle().get(key)
        })
        .await
        .and_then(|raw| raw.map(|payload| self.codec.decode::<T>(&payload)).transpose());

        let value = self.settle(&lease, "get", key, outcome).flatten();
        debug!(key = %key, hit = value.is_some(), "Cache get");
        value
    }

    /// Writes `key` with the default TTL. Returns the store's acknowledgment.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Option<String> {
        self.set_with_ttl(key, value, DEFAULT_TTL_SECS).await
    }

    /// Writes `key`, expiring after `ttl_secs` seconds.
    pub async fn set_with_ttl<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_secs: u64) -> Option<String> {
        let lease = self.ready_lease()?;

        let payload = match self.codec.encode(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache value could not be encoded");
                return None;
            }
        };

        let outcome = with_timeout(self.manager.request_timeout(), TIMEOUT_MESSAGE, || {
            lease.handle().set_ex(key, &payload, ttl_secs)
        })
        .await;

        let ack = self.settle(&lease, "set", key, outcome).flatten();
        debug!(key = %key, ttl_secs, stored = ack.is_some(), "Cache set");
        ack
    }

    /// Removes `key`. Returns the number of keys removed.
    pub async fn delete(&self, key: &str) -> Option<i64> {
        let lease = self.ready_lease()?;

        let outcome = with_timeout(self.manager.request_timeout(), TIMEOUT_MESSAGE, || {
            lease.handle().del(key)
        })
        .await;

        let removed = self.settle(&lease, "delete", key, outcome);
        debug!(key = %key, removed = ?removed, "Cache delete");
        removed
    }

    /// Drops the current connection; the next call reconnects.
    pub fn disconnect(&self) {
        self.manager.disconnect();
    }

    /// Returns a handle that is ready for calls, if any.
    fn ready_lease(&self) -> Option<Lease> {
        let lease = self.manager.get_instance()?;
        match lease.status() {
            HandleStatus::Ready => Some(lease),
            status => {
                if status.is_terminal() {
                    self.manager.discard(&lease);
                }
                debug!(generation = lease.generation(), status = %status, "Store handle not ready");
                None
            }
        }
    }

    /// Turns an outcome into a value, discarding the handle on hard failures.
    fn settle<T>(&self, lease: &Lease, op: &'static str, key: &str, outcome: SoftcacheResult<T>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                self.handle_error(lease, op, key, &e);
                None
            }
        }
    }

    fn handle_error(&self, lease: &Lease, op: &'static str, key: &str, error: &SoftcacheError) {
        if error.is_transient() {
            debug!(op, key = %key, "Cache call timed out, keeping connection");
            return;
        }
        warn!(op, key = %key, error = %error, "Cache call failed, discarding connection");
        self.manager.discard(lease);
    }
}

impl<C: Codec> std::fmt::Debug for Cache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").field("manager", &self.manager).finish()
    }
}
