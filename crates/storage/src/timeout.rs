//! Deadline enforcement for storage backends.
//!
//! Provides [`TimeoutBackend`], a wrapper that applies a bounded timeout to
//! every operation before delegating to the inner backend. No gateway
//! store call may block indefinitely; an elapsed deadline surfaces as
//! [`StorageError::Timeout`], which callers classify per their own policy
//! (the rate limiter fails closed, everything else reports a retryable
//! internal error).
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use walletgate_storage::{MemoryBackend, StorageBackend, TimeoutBackend};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = TimeoutBackend::new(MemoryBackend::new(), Duration::from_secs(2));
//!
//! // Operations now carry a 2-second deadline
//! backend.set(b"key".to_vec(), b"value".to_vec()).await.unwrap();
//! # });
//! ```

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    backend::StorageBackend,
    error::{StorageError, StorageResult},
};

/// Default per-operation deadline.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(2);

/// A [`StorageBackend`] wrapper that bounds every operation with a deadline.
///
/// The deadline applies per call, not per retry; callers that retry
/// transient failures restart the clock on each attempt.
#[derive(Debug, Clone)]
pub struct TimeoutBackend<B> {
    inner: B,
    deadline: Duration,
}

impl<B: StorageBackend> TimeoutBackend<B> {
    /// Wraps a backend with the given per-operation deadline.
    pub fn new(inner: B, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    /// Wraps a backend with [`DEFAULT_OP_TIMEOUT`].
    pub fn with_default_deadline(inner: B) -> Self {
        Self::new(inner, DEFAULT_OP_TIMEOUT)
    }

    /// Returns a reference to the inner backend.
    #[must_use]
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Returns the configured per-operation deadline.
    #[must_use]
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    async fn bounded<T, F>(&self, fut: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>> + Send,
    {
        match tokio::time::timeout(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::timeout()),
        }
    }
}

#[async_trait]
impl<B: StorageBackend> StorageBackend for TimeoutBackend<B> {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        self.bounded(self.inner.get(key)).await
    }

    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        self.bounded(self.inner.set(key, value)).await
    }

    async fn set_with_ttl(&self, key: Vec<u8>, value: Vec<u8>, ttl: Duration) -> StorageResult<()> {
        self.bounded(self.inner.set_with_ttl(key, value, ttl)).await
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.bounded(self.inner.delete(key)).await
    }

    async fn incr_with_window(&self, key: &[u8], window: Duration) -> StorageResult<u64> {
        self.bounded(self.inner.incr_with_window(key, window)).await
    }

    async fn list_push(
        &self,
        key: Vec<u8>,
        value: Vec<u8>,
        keep: Option<usize>,
    ) -> StorageResult<()> {
        self.bounded(self.inner.list_push(key, value, keep)).await
    }

    async fn list_range(&self, key: &[u8], limit: usize) -> StorageResult<Vec<Bytes>> {
        self.bounded(self.inner.list_range(key, limit)).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.bounded(self.inner.health_check()).await
    }
}
