//! Storage backend trait definition.
//!
//! This module defines the [`StorageBackend`] trait, the key-value
//! abstraction the gateway core consumes. Production deployments back it
//! with a networked store; tests and development use
//! [`MemoryBackend`](crate::MemoryBackend).
//!
//! # Design Philosophy
//!
//! The trait provides a minimal, generic key-value interface:
//! - **Keys and values are bytes**: no assumptions about serialization format
//! - **Async by default**: all operations are async for non-blocking I/O
//! - **Compound operations are atomic**: the two read-modify-write shapes the
//!   gateway needs — counter increment with window reset, and list push with
//!   trim — are single backend operations, never caller-side sequences
//!
//! Domain logic (sessions, rate policies, audit records) lives in the
//! gateway crate built on top of this trait, not in the backends.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageResult;

/// Abstract storage backend for key-value operations.
///
/// Backends are expected to be thread-safe (`Send + Sync`) and support
/// concurrent operations.
///
/// # Key Operations
///
/// | Method | Description |
/// |--------|-------------|
/// | [`get`](StorageBackend::get) | Retrieve a single value by key |
/// | [`set`](StorageBackend::set) | Store a key-value pair |
/// | [`set_with_ttl`](StorageBackend::set_with_ttl) | Store with automatic expiration |
/// | [`delete`](StorageBackend::delete) | Remove a key |
/// | [`incr_with_window`](StorageBackend::incr_with_window) | Atomic windowed counter increment |
/// | [`list_push`](StorageBackend::list_push) | Atomic push-then-trim onto a list |
/// | [`list_range`](StorageBackend::list_range) | Read the newest entries of a list |
/// | [`health_check`](StorageBackend::health_check) | Verify backend availability |
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Retrieves a value by key.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(bytes))` if the key exists and has not expired
    /// - `Ok(None)` if the key doesn't exist or its TTL has elapsed
    /// - `Err(...)` on storage errors
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Stores a key-value pair.
    ///
    /// If the key already exists, its value is overwritten and any existing
    /// TTL is cleared.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()>;

    /// Stores a key-value pair with automatic expiration.
    ///
    /// After `ttl` elapses the key is logically absent: [`get`](Self::get)
    /// returns `Ok(None)` even if physical cleanup has not yet run.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn set_with_ttl(&self, key: Vec<u8>, value: Vec<u8>, ttl: Duration) -> StorageResult<()>;

    /// Deletes a key.
    ///
    /// Deleting a missing key is a no-op (returns `Ok(())`).
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn delete(&self, key: &[u8]) -> StorageResult<()>;

    /// Atomically increments a fixed-window counter, returning the new count.
    ///
    /// If the counter does not exist, or its previous window has elapsed,
    /// the counter resets to 1 and a fresh expiry of `window` from now is
    /// set. Otherwise the count increments and the existing window is left
    /// untouched.
    ///
    /// The reset-and-first-increment of a new window must be a single atomic
    /// step: two concurrent calls on a fresh key must observe counts 1 and 2
    /// within one window, never 1 and 1 across two windows.
    #[must_use = "the returned count decides whether the caller is within limits"]
    async fn incr_with_window(&self, key: &[u8], window: Duration) -> StorageResult<u64>;

    /// Atomically pushes a value onto the front of a list, then trims it.
    ///
    /// When `keep` is `Some(n)`, only the newest `n` entries are retained
    /// after the push; older entries are discarded. When `keep` is `None`
    /// the list grows without bound (retention is the store's concern).
    ///
    /// Push and trim are a single atomic operation; concurrent pushes never
    /// leave the list longer than `n`.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn list_push(
        &self,
        key: Vec<u8>,
        value: Vec<u8>,
        keep: Option<usize>,
    ) -> StorageResult<()>;

    /// Reads up to `limit` entries from a list, newest first.
    ///
    /// A missing list reads as empty.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn list_range(&self, key: &[u8], limit: usize) -> StorageResult<Vec<Bytes>>;

    /// Verifies that the backend is reachable and serving requests.
    #[must_use = "health check results indicate backend availability and must be inspected"]
    async fn health_check(&self) -> StorageResult<()>;
}
