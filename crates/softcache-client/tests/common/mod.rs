//! In-memory store used by the facade and manager tests.
//!
//! `FakeServer` plays the external store; `FakeConnector` builds handles to
//! it and records every construction so tests can tell a reused connection
//! from a fresh one. `container` runs a real Redis for the transport tests.

#![allow(dead_code)]

pub mod container;

use async_trait::async_trait;
use parking_lot::Mutex;
use softcache_client::{Connector, HandleEvent, HandleEvents, HandleStatus, ResolvedOptions, StoreHandle};
use softcache_core::{SoftcacheError, SoftcacheResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Stored value and the expiry it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub value: String,
    pub ttl_secs: u64,
}

/// The external store.
#[derive(Default)]
pub struct FakeServer {
    entries: Mutex<HashMap<String, StoredEntry>>,
}

impl FakeServer {
    pub fn entry(&self, key: &str) -> Option<StoredEntry> {
        self.entries.lock().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries.lock().insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                ttl_secs: 0,
            },
        );
    }
}

/// A connection to the fake server with injectable faults.
pub struct FakeHandle {
    server: Arc<FakeServer>,
    status: AtomicU8,
    delay: Mutex<Option<Duration>>,
    fail_next: Mutex<Option<String>>,
    calls: AtomicUsize,
    events: HandleEvents,
}

impl FakeHandle {
    pub fn set_status(&self, status: HandleStatus) {
        self.status.store(status as u8, Ordering::SeqCst);
    }

    /// Delays every following call by `delay`.
    pub fn delay_calls(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Fails the next call with a store error carrying `message`.
    pub fn fail_next(&self, message: &str) {
        *self.fail_next.lock() = Some(message.to_string());
    }

    /// Raises an event as the transport would.
    pub fn emit(&self, event: HandleEvent) {
        self.events.emit(event);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn begin(&self) -> SoftcacheResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.fail_next.lock().take() {
            return Err(SoftcacheError::store(message));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreHandle for FakeHandle {
    fn status(&self) -> HandleStatus {
        HandleStatus::from(self.status.load(Ordering::SeqCst))
    }

    async fn get(&self, key: &str) -> SoftcacheResult<Option<String>> {
        self.begin().await?;
        Ok(self.server.entry(key).map(|entry| entry.value))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> SoftcacheResult<Option<String>> {
        self.begin().await?;
        self.server.entries.lock().insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                ttl_secs,
            },
        );
        Ok(Some("OK".to_string()))
    }

    async fn del(&self, key: &str) -> SoftcacheResult<i64> {
        self.begin().await?;
        Ok(i64::from(self.server.entries.lock().remove(key).is_some()))
    }
}

/// Builds `FakeHandle`s and keeps every one it built.
pub struct FakeConnector {
    pub server: Arc<FakeServer>,
    initial_status: Mutex<HandleStatus>,
    refuse: Mutex<Option<String>>,
    handles: Mutex<Vec<Arc<FakeHandle>>>,
    last_options: Mutex<Option<ResolvedOptions>>,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            server: Arc::new(FakeServer::default()),
            initial_status: Mutex::new(HandleStatus::Ready),
            refuse: Mutex::new(None),
            handles: Mutex::new(Vec::new()),
            last_options: Mutex::new(None),
        })
    }

    /// Status that newly built handles start in.
    pub fn start_as(&self, status: HandleStatus) {
        *self.initial_status.lock() = status;
    }

    /// Makes construction fail with `message` until cleared.
    pub fn refuse(&self, message: Option<&str>) {
        *self.refuse.lock() = message.map(str::to_string);
    }

    pub fn constructions(&self) -> usize {
        self.handles.lock().len()
    }

    /// Most recently built handle.
    pub fn latest(&self) -> Arc<FakeHandle> {
        self.handles
            .lock()
            .last()
            .cloned()
            .expect("no handle has been built")
    }

    pub fn last_options(&self) -> Option<ResolvedOptions> {
        self.last_options.lock().clone()
    }
}

impl Connector for FakeConnector {
    fn connect(&self, options: &ResolvedOptions, events: HandleEvents) -> SoftcacheResult<Arc<dyn StoreHandle>> {
        *self.last_options.lock() = Some(options.clone());

        if let Some(message) = self.refuse.lock().clone() {
            return Err(SoftcacheError::connection(message));
        }

        let handle = Arc::new(FakeHandle {
            server: Arc::clone(&self.server),
            status: AtomicU8::new(*self.initial_status.lock() as u8),
            delay: Mutex::new(None),
            fail_next: Mutex::new(None),
            calls: AtomicUsize::new(0),
            events,
        });
        self.handles.lock().push(Arc::clone(&handle));
        Ok(handle)
    }
}
