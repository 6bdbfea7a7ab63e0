//! Redis transport, single node or cluster.

use crate::handle::{Connector, HandleEvent, HandleStatus, StoreHandle};
use crate::manager::HandleEvents;
use crate::options::{NodeOptions, ReadFrom, ResolvedOptions, Topology};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::cluster::ClusterClientBuilder;
use redis::cluster_async::ClusterConnection;
use redis::{AsyncCommands, ConnectionInfo, IntoConnectionInfo, RedisError};
use softcache_core::{SoftcacheError, SoftcacheResult};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Builds Redis handles.
///
/// Single-node handles use a multiplexed connection rather than
/// `redis::aio::ConnectionManager`, which would reconnect by itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisConnector;

impl RedisConnector {
    /// Creates a connector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Connector for RedisConnector {
    fn connect(&self, options: &ResolvedOptions, events: HandleEvents) -> SoftcacheResult<Arc<dyn StoreHandle>> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SoftcacheError::connection(format!("No async runtime: {}", e)))?;

        match &options.topology {
            Topology::Single(node) => {
                let host = node
                    .host
                    .as_deref()
                    .ok_or_else(|| SoftcacheError::configuration("Single node requires a host"))?;
                let port = node
                    .port
                    .ok_or_else(|| SoftcacheError::configuration("Single node requires a port"))?;
                let client = redis::Client::open(connection_info(host, port, node)?).map_err(store_error)?;

                let handle = Arc::new(RedisHandle::new(node.key_prefix.clone(), events));
                let pending = Arc::clone(&handle);
                let deadline = node.connect_timeout;
                runtime.spawn(async move {
                    let result = tokio::time::timeout(deadline, client.get_multiplexed_async_connection()).await;
                    pending.settle(result, deadline, StoreConnection::Single);
                });
                Ok(handle)
            }
            Topology::Cluster(cluster) => {
                let nodes = cluster
                    .nodes
                    .iter()
                    .map(|(host, port)| connection_info(host, *port, &cluster.node))
                    .collect::<SoftcacheResult<Vec<_>>>()?;

                let mut builder = ClusterClientBuilder::new(nodes).retries(cluster.cluster_retries);
                if cluster.read_from == ReadFrom::Replica {
                    builder = builder.read_from_replicas();
                }
                if let Some(password) = &cluster.node.password {
                    builder = builder.password(password.clone());
                }
                let client = builder.build().map_err(store_error)?;

                let handle = Arc::new(RedisHandle::new(cluster.node.key_prefix.clone(), events));
                let pending = Arc::clone(&handle);
                let deadline = cluster.node.connect_timeout;
                runtime.spawn(async move {
                    let result = tokio::time::timeout(deadline, client.get_async_connection()).await;
                    pending.settle(result, deadline, StoreConnection::Cluster);
                });
                Ok(handle)
            }
        }
    }
}

fn connection_info(host: &str, port: u16, node: &NodeOptions) -> SoftcacheResult<ConnectionInfo> {
    let mut info = (host, port).into_connection_info().map_err(store_error)?;
    info.redis.password.clone_from(&node.password);
    Ok(info)
}

fn store_error(err: RedisError) -> SoftcacheError {
    if err.is_connection_dropped() || err.is_connection_refusal() || err.is_io_error() {
        SoftcacheError::connection(err.to_string())
    } else {
        SoftcacheError::store(err.to_string())
    }
}

#[derive(Clone)]
enum StoreConnection {
    Single(MultiplexedConnection),
    Cluster(ClusterConnection),
}

/// A Redis connection that becomes ready in the background.
pub struct RedisHandle {
    key_prefix: Option<String>,
    status: AtomicU8,
    connection: OnceLock<StoreConnection>,
    events: HandleEvents,
}

impl RedisHandle {
    fn new(key_prefix: Option<String>, events: HandleEvents) -> Self {
        Self {
            key_prefix,
            status: AtomicU8::new(HandleStatus::Connecting as u8),
            connection: OnceLock::new(),
            events,
        }
    }

    fn set_status(&self, status: HandleStatus) {
        self.status.store(status as u8, Ordering::SeqCst);
    }

    /// Records the outcome of the background connect.
    fn settle<C>(
        &self,
        result: Result<Result<C, RedisError>, tokio::time::error::Elapsed>,
        deadline: Duration,
        wrap: fn(C) -> StoreConnection,
    ) {
        match result {
            Ok(Ok(conn)) => {
                if self.connection.set(wrap(conn)).is_ok() {
                    self.set_status(HandleStatus::Ready);
                    info!(generation = self.events.generation(), "Store connection ready");
                }
            }
            Ok(Err(e)) => {
                self.set_status(HandleStatus::Errored);
                warn!(generation = self.events.generation(), error = %e, "Store connection failed");
                self.events.emit(HandleEvent::Error(e.to_string()));
            }
            Err(_) => {
                self.set_status(HandleStatus::Errored);
                let message = format!("Connect timed out after {:?}", deadline);
                warn!(generation = self.events.generation(), "{}", message);
                self.events.emit(HandleEvent::Error(message));
            }
        }
    }

    fn prefixed(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}{}", prefix, key),
            None => key.to_string(),
        }
    }

    fn connection(&self) -> SoftcacheResult<StoreConnection> {
        self.connection
            .get()
            .cloned()
            .ok_or_else(|| SoftcacheError::connection("Connection not established"))
    }

    /// Maps a command failure, raising a close event when the link is gone.
    fn command_failed(&self, err: RedisError) -> SoftcacheError {
        if err.is_connection_dropped() || err.is_io_error() {
            self.set_status(HandleStatus::Closed);
            debug!(generation = self.events.generation(), error = %err, "Store connection lost");
            self.events.emit(HandleEvent::Close);
        }
        store_error(err)
    }
}

#[async_trait]
impl StoreHandle for RedisHandle {
    fn status(&self) -> HandleStatus {
        HandleStatus::from(self.status.load(Ordering::SeqCst))
    }

    async fn get(&self, key: &str) -> SoftcacheResult<Option<String>> {
        let key = self.prefixed(key);
        let result: Result<Option<String>, RedisError> = match &mut self.connection()? {
            StoreConnection::Single(conn) => conn.get(&key).await,
            StoreConnection::Cluster(conn) => conn.get(&key).await,
        };
        result.map_err(|e| self.command_failed(e))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> SoftcacheResult<Option<String>> {
        let key = self.prefixed(key);
        let result: Result<Option<String>, RedisError> = match &mut self.connection()? {
            StoreConnection::Single(conn) => conn.set_ex(&key, value, ttl_secs).await,
            StoreConnection::Cluster(conn) => conn.set_ex(&key, value, ttl_secs).await,
        };
        result.map_err(|e| self.command_failed(e))
    }

    async fn del(&self, key: &str) -> SoftcacheResult<i64> {
        let key = self.prefixed(key);
        let result: Result<i64, RedisError> = match &mut self.connection()? {
            StoreConnection::Single(conn) => conn.del(&key).await,
            StoreConnection::Cluster(conn) => conn.del(&key).await,
        };
        result.map_err(|e| self.command_failed(e))
    }
}
