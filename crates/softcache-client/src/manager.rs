//! Connection manager: owns the single, lazily built store handle.

use crate::handle::{Connector, HandleEvent, HandleStatus, StoreHandle};
use crate::options::ResolvedOptions;
use parking_lot::Mutex;
use softcache_config::CacheCredentials;
use softcache_core::TIMEOUT_MESSAGE;
use softcache_resilience::TimeoutConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A handle together with the generation it was installed under.
#[derive(Clone)]
pub struct Lease {
    generation: u64,
    handle: Arc<dyn StoreHandle>,
}

impl Lease {
    /// Generation of the handle; increases with every construction.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The store handle.
    #[must_use]
    pub fn handle(&self) -> &Arc<dyn StoreHandle> {
        &self.handle
    }

    /// Current liveness of the handle.
    #[must_use]
    pub fn status(&self) -> HandleStatus {
        self.handle.status()
    }
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("generation", &self.generation)
            .field("status", &self.status())
            .finish()
    }
}

/// Single-assignment slot shared with the event sinks of live handles.
#[derive(Default)]
struct Slot {
    current: Mutex<Option<Lease>>,
    generations: AtomicU64,
}

impl Slot {
    fn clear(&self) -> Option<Lease> {
        self.current.lock().take()
    }

    /// Clears the slot only if it still holds `generation`.
    fn clear_generation(&self, generation: u64) -> bool {
        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|lease| lease.generation == generation) {
            *current = None;
            true
        } else {
            false
        }
    }

    fn process(&self, generation: u64, event: HandleEvent) {
        match event {
            HandleEvent::Error(message) if message == TIMEOUT_MESSAGE => {
                debug!(generation, "Transient error event, keeping connection");
            }
            HandleEvent::Error(message) => {
                if self.clear_generation(generation) {
                    warn!(generation, error = %message, "Store connection errored, discarding handle");
                }
            }
            HandleEvent::Close => {
                if self.clear_generation(generation) {
                    warn!(generation, "Store connection closed, discarding handle");
                }
            }
        }
    }
}

/// Channel through which a handle reports errors and closure.
///
/// Events from a handle that has already been replaced are ignored.
#[derive(Clone)]
pub struct HandleEvents {
    slot: Weak<Slot>,
    generation: u64,
}

impl HandleEvents {
    /// A sink that drops every event.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            slot: Weak::new(),
            generation: 0,
        }
    }

    /// Generation of the handle this sink belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Reports an event to the owning manager, if it still exists.
    pub fn emit(&self, event: HandleEvent) {
        if let Some(slot) = self.slot.upgrade() {
            slot.process(self.generation, event);
        }
    }
}

impl std::fmt::Debug for HandleEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleEvents")
            .field("generation", &self.generation)
            .field("attached", &(self.slot.strong_count() > 0))
            .finish()
    }
}

/// Owns the process-wide store handle.
///
/// At most one handle is installed at a time. It is built on first use,
/// dropped on any hard failure or close notification, and rebuilt by the
/// next call. Construction is not serialized: two callers that both find
/// the slot empty each build a handle and the later one wins. The loser is
/// dropped once its in-flight calls finish.
pub struct ConnectionManager {
    credentials: Arc<CacheCredentials>,
    connector: Arc<dyn Connector>,
    timeouts: TimeoutConfig,
    slot: Arc<Slot>,
}

impl ConnectionManager {
    /// Creates a manager; no connection is made until first use.
    pub fn new(credentials: Arc<CacheCredentials>, connector: Arc<dyn Connector>) -> Self {
        let timeouts = TimeoutConfig::with_request_timeout(credentials.request_timeout());
        Self {
            credentials,
            connector,
            timeouts,
            slot: Arc::new(Slot::default()),
        }
    }

    /// The credentials this manager was built from.
    #[must_use]
    pub fn credentials(&self) -> &CacheCredentials {
        &self.credentials
    }

    /// Call and connect deadlines.
    #[must_use]
    pub const fn timeouts(&self) -> TimeoutConfig {
        self.timeouts
    }

    /// Deadline for a single store call.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.timeouts.request_timeout
    }

    /// Resolves the credentials into topology-specific options.
    #[must_use]
    pub fn resolve_options(&self) -> ResolvedOptions {
        ResolvedOptions::resolve(&self.credentials)
    }

    /// Returns the current handle, building one if the slot is empty.
    ///
    /// Returns `None` when caching is disabled or construction fails; a
    /// construction failure is logged and never propagated.
    pub fn get_instance(&self) -> Option<Lease> {
        if self.credentials.ignore {
            return None;
        }

        if let Some(lease) = self.slot.current.lock().clone() {
            return Some(lease);
        }

        let generation = self.slot.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let options = self.resolve_options();
        let events = HandleEvents {
            slot: Arc::downgrade(&self.slot),
            generation,
        };

        match self.connector.connect(&options, events) {
            Ok(handle) => {
                let lease = Lease { generation, handle };
                *self.slot.current.lock() = Some(lease.clone());
                info!(
                    generation,
                    addr = %self.credentials.addr(),
                    cluster = options.is_cluster(),
                    "Store handle created"
                );
                Some(lease)
            }
            Err(e) => {
                warn!(generation, error = %e, "Failed to create store handle");
                None
            }
        }
    }

    /// Drops the current handle so the next call builds a fresh one.
    ///
    /// Idempotent. No network operation is made.
    pub fn disconnect(&self) {
        if let Some(lease) = self.slot.clear() {
            debug!(generation = lease.generation, "Store handle discarded");
        }
    }

    /// Drops `lease`'s handle if it is still the current one.
    ///
    /// A failure observed on a handle that was already replaced leaves the
    /// newer handle alone.
    pub fn discard(&self, lease: &Lease) {
        if self.slot.clear_generation(lease.generation) {
            debug!(generation = lease.generation, "Store handle discarded");
        }
    }

    /// Processes an event raised by the handle of `generation`.
    pub fn handle_event(&self, generation: u64, event: HandleEvent) {
        self.slot.process(generation, event);
    }

    /// Returns true if a handle is installed.
    #[must_use]
    pub fn has_instance(&self) -> bool {
        self.slot.current.lock().is_some()
    }

    /// Number of handles built so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.slot.generations.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("addr", &self.credentials.addr())
            .field("generation", &self.generation())
            .field("has_instance", &self.has_instance())
            .finish()
    }
}
