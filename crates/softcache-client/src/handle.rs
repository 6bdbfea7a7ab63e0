//! Store seam: the capability set a connection handle offers.

use crate::manager::HandleEvents;
use crate::options::ResolvedOptions;
use async_trait::async_trait;
use softcache_core::SoftcacheResult;
use std::fmt;
use std::sync::Arc;

/// Liveness of a connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandleStatus {
    /// Connection is being established.
    Connecting = 0,
    /// Connection is usable.
    Ready = 1,
    /// Connection was closed by the peer or the network.
    Closed = 2,
    /// Connection failed to establish or hit a fatal error.
    Errored = 3,
}

impl HandleStatus {
    /// A handle in this state will never become ready again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }
}

impl From<u8> for HandleStatus {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Ready,
            2 => Self::Closed,
            _ => Self::Errored,
        }
    }
}

impl fmt::Display for HandleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Closed => "closed",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Notification a handle raises outside of any call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleEvent {
    /// The transport hit an error.
    Error(String),
    /// The transport closed.
    Close,
}

/// A live connection to the store.
///
/// Keys are logical; a transport that supports key prefixes applies them
/// itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreHandle: Send + Sync {
    /// Current liveness.
    fn status(&self) -> HandleStatus;

    /// `GET key`.
    async fn get(&self, key: &str) -> SoftcacheResult<Option<String>>;

    /// `SET key value EX ttl_secs`, returning the store's acknowledgment.
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> SoftcacheResult<Option<String>>;

    /// `DEL key`, returning the number of keys removed.
    async fn del(&self, key: &str) -> SoftcacheResult<i64>;
}

/// Builds connection handles.
///
/// `connect` must not block on the network: it returns a handle that
/// reports [`HandleStatus::Connecting`] until the transport is usable, and
/// reports later failures through `events`.
pub trait Connector: Send + Sync {
    /// Builds a new handle for the given options.
    fn connect(&self, options: &ResolvedOptions, events: HandleEvents) -> SoftcacheResult<Arc<dyn StoreHandle>>;
}

impl<F> Connector for F
where
    F: Fn(&ResolvedOptions, HandleEvents) -> SoftcacheResult<Arc<dyn StoreHandle>> + Send + Sync,
{
    fn connect(&self, options: &ResolvedOptions, events: HandleEvents) -> SoftcacheResult<Arc<dyn StoreHandle>> {
        self(options, events)
    }
}
