//! In-memory storage backend implementation.
//!
//! This module provides [`MemoryBackend`], an in-memory implementation of
//! [`StorageBackend`] suitable for testing and development.
//!
//! # Features
//!
//! - **Thread-safe**: [`parking_lot`] locks for concurrent access
//! - **TTL support**: expired keys are hidden on read; a background task removes them
//! - **Atomic compound operations**: windowed counter increments and
//!   push-then-trim list appends each run inside a single critical section
//!
//! # Example
//!
//! ```
//! use walletgate_storage::{MemoryBackend, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MemoryBackend::new();
//!
//!     backend.set(b"greeting".to_vec(), b"hello".to_vec()).await.unwrap();
//!     let value = backend.get(b"greeting").await.unwrap();
//!
//!     assert_eq!(value.unwrap().as_ref(), b"hello");
//! }
//! ```
//!
//! # Limitations
//!
//! - Data is not persisted; all data is lost when the process exits
//! - TTL cleanup runs every second, so physical removal is not precise
//!   (logical expiry on read is)

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tokio::{select, sync::watch, time::sleep};

use crate::{backend::StorageBackend, error::StorageResult};

/// Holds the shutdown signal sender. When dropped, the watch channel
/// closes and the cleanup task exits.
struct ShutdownGuard {
    shutdown_tx: watch::Sender<()>,
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        // Sending is a best-effort signal; the receiver may already be gone.
        let _ = self.shutdown_tx.send(());
    }
}

/// State of one fixed-window counter.
#[derive(Debug, Clone, Copy)]
struct CounterState {
    count: u64,
    window_ends_at: Instant,
}

/// In-memory storage backend.
///
/// Primarily intended for testing, but usable for development or
/// small-scale deployments where persistence is not required.
///
/// # Cloning
///
/// `MemoryBackend` is cheaply cloneable via [`Arc`]. All clones share the
/// same underlying data.
///
/// # Shutdown
///
/// The background TTL cleanup task stops automatically when all clones are
/// dropped (via the internal `ShutdownGuard`). Call
/// [`shutdown`](Self::shutdown) to stop it explicitly.
#[derive(Clone)]
pub struct MemoryBackend {
    data: Arc<RwLock<BTreeMap<Vec<u8>, Bytes>>>,
    ttl_data: Arc<RwLock<BTreeMap<Vec<u8>, Instant>>>,
    /// Counter state lives under its own mutex so increment-with-window is
    /// one critical section, independent of plain key-value traffic.
    counters: Arc<Mutex<HashMap<Vec<u8>, CounterState>>>,
    /// Same isolation for lists: push-then-trim holds this lock once.
    lists: Arc<Mutex<HashMap<Vec<u8>, VecDeque<Bytes>>>>,
    shutdown_guard: Arc<ShutdownGuard>,
}

impl MemoryBackend {
    /// Creates a new in-memory storage backend.
    ///
    /// Also spawns a background task that periodically removes expired keys
    /// and lapsed counter windows. The task stops automatically when all
    /// clones of the backend are dropped.
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let backend = Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
            ttl_data: Arc::new(RwLock::new(BTreeMap::new())),
            counters: Arc::new(Mutex::new(HashMap::new())),
            lists: Arc::new(Mutex::new(HashMap::new())),
            shutdown_guard: Arc::new(ShutdownGuard { shutdown_tx }),
        };

        let backend_clone = backend.clone();
        tokio::spawn(async move {
            backend_clone.cleanup_expired(shutdown_rx).await;
        });

        backend
    }

    /// Background task removing expired keys and lapsed counter windows.
    ///
    /// Runs every second. Exits when the shutdown signal is received.
    async fn cleanup_expired(&self, mut shutdown_rx: watch::Receiver<()>) {
        loop {
            select! {
                _ = sleep(Duration::from_secs(1)) => {}
                _ = shutdown_rx.changed() => {
                    return;
                }
            }

            let now = Instant::now();
            let mut expired_keys = Vec::new();

            {
                let ttl_guard = self.ttl_data.read();
                for (key, expiry) in ttl_guard.iter() {
                    if *expiry <= now {
                        expired_keys.push(key.clone());
                    }
                }
            }

            if !expired_keys.is_empty() {
                let mut data_guard = self.data.write();
                let mut ttl_guard = self.ttl_data.write();
                for key in expired_keys {
                    data_guard.remove(&key);
                    ttl_guard.remove(&key);
                }
            }

            // Counters whose window has lapsed are dead weight; the next
            // increment would reset them anyway.
            self.counters.lock().retain(|_, state| state.window_ends_at > now);
        }
    }

    /// Explicitly signals the background cleanup task to stop.
    ///
    /// Optional — the task also stops when all clones are dropped. Use this
    /// when you need deterministic shutdown timing (e.g., in tests).
    pub fn shutdown(&self) {
        let _ = self.shutdown_guard.shutdown_tx.send(());
    }

    /// Checks if a key has expired.
    fn is_expired(&self, key: &[u8]) -> bool {
        let ttl_guard = self.ttl_data.read();
        if let Some(expiry) = ttl_guard.get(key) {
            return *expiry <= Instant::now();
        }
        false
    }

    #[cfg(test)]
    fn backdate_counter_window(&self, key: &[u8], by: Duration) {
        let mut counters = self.counters.lock();
        if let Some(state) = counters.get_mut(key) {
            state.window_ends_at -= by;
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        if self.is_expired(key) {
            return Ok(None);
        }

        let data = self.data.read();
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        let mut data = self.data.write();
        data.insert(key.clone(), Bytes::from(value));

        // Set without TTL clears any existing TTL.
        {
            let mut ttl_guard = self.ttl_data.write();
            ttl_guard.remove(&key);
        }

        Ok(())
    }

    async fn set_with_ttl(&self, key: Vec<u8>, value: Vec<u8>, ttl: Duration) -> StorageResult<()> {
        let mut data = self.data.write();
        let mut ttl_data = self.ttl_data.write();

        let expiry = Instant::now() + ttl;

        data.insert(key.clone(), Bytes::from(value));
        ttl_data.insert(key, expiry);

        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        let mut data = self.data.write();
        data.remove(key);

        {
            let mut ttl_guard = self.ttl_data.write();
            ttl_guard.remove(key);
        }

        Ok(())
    }

    async fn incr_with_window(&self, key: &[u8], window: Duration) -> StorageResult<u64> {
        let now = Instant::now();
        let mut counters = self.counters.lock();

        let state = counters
            .entry(key.to_vec())
            .and_modify(|state| {
                if state.window_ends_at <= now {
                    // Window elapsed: reset and open a new one. Happens under
                    // the same lock as the increment, so exactly one caller
                    // defines the new window start.
                    state.count = 1;
                    state.window_ends_at = now + window;
                } else {
                    state.count += 1;
                }
            })
            .or_insert(CounterState { count: 1, window_ends_at: now + window });

        Ok(state.count)
    }

    async fn list_push(
        &self,
        key: Vec<u8>,
        value: Vec<u8>,
        keep: Option<usize>,
    ) -> StorageResult<()> {
        let mut lists = self.lists.lock();
        let list = lists.entry(key).or_default();
        list.push_front(Bytes::from(value));
        if let Some(keep) = keep {
            list.truncate(keep);
        }
        Ok(())
    }

    async fn list_range(&self, key: &[u8], limit: usize) -> StorageResult<Vec<Bytes>> {
        let lists = self.lists.lock();
        Ok(lists.get(key).map(|l| l.iter().take(limit).cloned().collect()).unwrap_or_default())
    }

    async fn health_check(&self) -> StorageResult<()> {
        // Try to acquire a read lock to verify we're not deadlocked.
        let _unused = self.data.read();
        Ok(())
    }
}
