//! Connection options resolved from credentials.

use softcache_config::CacheCredentials;
use softcache_resilience::TimeoutConfig;
use std::time::Duration;

pub use softcache_resilience::FIXED_CONNECT_TIMEOUT;

/// Where reads are routed in a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFrom {
    /// Primaries only.
    Primary,
    /// Replicas when available.
    Replica,
}

/// Per-node connection options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOptions {
    /// Node host; absent for cluster nodes, which are listed separately.
    pub host: Option<String>,
    /// Node port; absent for cluster nodes.
    pub port: Option<u16>,
    /// Auth password.
    pub password: Option<String>,
    /// Prefix prepended to every key.
    pub key_prefix: Option<String>,
    /// Deadline for establishing the connection.
    pub connect_timeout: Duration,
    /// Transport-level retries per command. Always zero.
    pub max_retries: u32,
    /// Whether the transport reconnects by itself after an error. Always false.
    pub reconnect_on_error: bool,
}

/// Cluster connection options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterOptions {
    /// Seed nodes as `(host, port)`.
    pub nodes: Vec<(String, u16)>,
    /// Read routing.
    pub read_from: ReadFrom,
    /// Cluster-level retries. Always zero.
    pub cluster_retries: u32,
    /// Options applied to every node connection.
    pub node: NodeOptions,
}

/// Addressing mode of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topology {
    /// A single node.
    Single(NodeOptions),
    /// A cluster reached through seed nodes.
    Cluster(ClusterOptions),
}

/// Everything needed to build a handle and issue calls on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    /// Topology-specific connection options.
    pub topology: Topology,
    /// Deadline for a single store call.
    pub request_timeout: Duration,
}

impl ResolvedOptions {
    /// Resolves credentials into connection options.
    ///
    /// Reconnection belongs to the connection manager, so the transport is
    /// told never to retry or reconnect on its own.
    #[must_use]
    pub fn resolve(credentials: &CacheCredentials) -> Self {
        let timeouts = TimeoutConfig::with_request_timeout(credentials.request_timeout());
        let node = NodeOptions {
            host: Some(credentials.host.clone()),
            port: Some(credentials.port),
            password: credentials.password.clone(),
            key_prefix: credentials.key_prefix.clone(),
            connect_timeout: timeouts.connect_timeout,
            max_retries: 0,
            reconnect_on_error: false,
        };

        let topology = if credentials.is_cluster {
            Topology::Cluster(ClusterOptions {
                nodes: vec![(credentials.host.clone(), credentials.port)],
                read_from: ReadFrom::Replica,
                cluster_retries: 0,
                node: NodeOptions {
                    host: None,
                    port: None,
                    ..node
                },
            })
        } else {
            Topology::Single(node)
        };

        Self {
            topology,
            request_timeout: timeouts.request_timeout,
        }
    }

    /// Returns true for cluster topology.
    #[must_use]
    pub const fn is_cluster(&self) -> bool {
        matches!(self.topology, Topology::Cluster(_))
    }
}
