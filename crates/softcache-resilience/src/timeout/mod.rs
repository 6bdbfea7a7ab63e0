//! Timeout wrapper for async operations.

use softcache_core::SoftcacheError;
use std::time::Duration;
use tracing::trace;

/// Races an async operation against a deadline.
///
/// Resolves to the operation's own outcome, success or failure, if it
/// settles first. Otherwise fails with [`SoftcacheError::Timeout`] carrying
/// `message` verbatim. The losing operation is dropped without any signal
/// to the remote side; a reply that arrives later is discarded.
pub async fn with_timeout<F, Fut, T>(duration: Duration, message: &str, f: F) -> Result<T, SoftcacheError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, SoftcacheError>>,
{
    tokio::time::timeout(duration, f()).await.map_err(|_| {
        trace!(deadline_ms = duration.as_millis() as u64, "Deadline elapsed");
        SoftcacheError::Timeout(message.to_string())
    })?
}

/// Connect deadline applied to every store connection.
///
/// The configured connect timeout is not used for the transport.
pub const FIXED_CONNECT_TIMEOUT: Duration = Duration::from_millis(200);

/// Default per-call deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(300);

/// Timeout configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Deadline for a single store call.
    pub request_timeout: Duration,
    /// Deadline for establishing a connection.
    pub connect_timeout: Duration,
}

impl TimeoutConfig {
    /// Uses `request_timeout` for calls and the fixed connect deadline.
    #[must_use]
    pub const fn with_request_timeout(request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            connect_timeout: FIXED_CONNECT_TIMEOUT,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::with_request_timeout(DEFAULT_REQUEST_TIMEOUT)
    }
}
