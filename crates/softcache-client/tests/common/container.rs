//! Redis testcontainer for transport tests.

use redis::AsyncCommands;
use softcache_client::{Cache, HandleStatus};
use softcache_config::CacheCredentials;
use std::time::Duration;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::redis::{Redis, REDIS_PORT};

/// A Redis server in a throwaway container.
pub struct TestRedis {
    container: ContainerAsync<Redis>,
    port: u16,
}

impl TestRedis {
    /// Starts a fresh Redis container.
    pub async fn start() -> Self {
        let container = Redis::default()
            .start()
            .await
            .expect("Failed to start Redis container");

        let port = container
            .get_host_port_ipv4(REDIS_PORT)
            .await
            .expect("Failed to get Redis port");

        Self { container, port }
    }

    /// Credentials pointing at this server, with keys under `prefix`.
    pub fn credentials(&self, prefix: &str) -> CacheCredentials {
        CacheCredentials {
            host: "127.0.0.1".to_string(),
            port: self.port,
            key_prefix: Some(prefix.to_string()),
            request_timeout_ms: 1000,
            ..Default::default()
        }
    }

    /// A plain connection for inspecting what the cache wrote.
    pub async fn raw(&self) -> redis::aio::MultiplexedConnection {
        redis::Client::open(format!("redis://127.0.0.1:{}/", self.port))
            .expect("Invalid Redis URL")
            .get_multiplexed_async_connection()
            .await
            .expect("Failed to connect to Redis")
    }

    /// Raw value stored under the full, prefixed key.
    pub async fn raw_get(&self, key: &str) -> Option<String> {
        self.raw().await.get(key).await.expect("GET failed")
    }

    /// Remaining TTL of the full, prefixed key.
    pub async fn raw_ttl(&self, key: &str) -> i64 {
        self.raw().await.ttl(key).await.expect("TTL failed")
    }

    /// Stops the server; open connections are dropped.
    pub async fn stop(&self) {
        self.container.stop().await.expect("Failed to stop Redis container");
    }
}

/// Waits until `cache` holds a ready handle, rebuilding after failed connects.
pub async fn wait_until_ready(cache: &Cache) {
    for _ in 0..50 {
        if let Some(lease) = cache.manager().get_instance() {
            if lease.status() == HandleStatus::Ready {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("Store handle never became ready");
}
