//! Cached user directory.
//!
//! Wraps any [`UserDirectory`] with an in-memory, TTL-bounded cache so the
//! authentication hot path does not pay a directory round-trip per request.
//! Unknown wallets are *not* negatively cached: a user created moments
//! after a miss must resolve on the next attempt.
//!
//! The TTL bounds permission staleness: a permission change in the backing
//! directory propagates within one cache lifetime, or immediately via
//! [`invalidate`](CachedUserDirectory::invalidate).

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use moka::future::Cache;
use walletgate_storage::{StorageResult, UserDirectory, UserRecord};

/// Default cache entry lifetime (1 hour).
pub const DEFAULT_USER_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Default maximum number of cached records.
pub const DEFAULT_USER_CACHE_CAPACITY: u64 = 10_000;

/// A TTL-bounded cache over a [`UserDirectory`].
pub struct CachedUserDirectory {
    cache: Cache<String, UserRecord>,
    inner: Arc<dyn UserDirectory>,
}

impl std::fmt::Debug for CachedUserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedUserDirectory")
            .field("entry_count", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl CachedUserDirectory {
    /// Wraps a directory with the default TTL and capacity.
    #[must_use]
    pub fn new(inner: Arc<dyn UserDirectory>) -> Self {
        Self::with_ttl(inner, DEFAULT_USER_CACHE_TTL, DEFAULT_USER_CACHE_CAPACITY)
    }

    /// Wraps a directory with a custom TTL and capacity.
    #[must_use]
    pub fn with_ttl(inner: Arc<dyn UserDirectory>, ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(capacity).time_to_live(ttl).build();
        Self { cache, inner }
    }

    /// Drops the cached record for a wallet, forcing the next lookup to hit
    /// the backing directory.
    pub async fn invalidate(&self, wallet_address: &str) {
        self.cache.invalidate(wallet_address).await;
    }
}

#[async_trait]
impl UserDirectory for CachedUserDirectory {
    async fn get_user_by_wallet(&self, wallet_address: &str) -> StorageResult<Option<UserRecord>> {
        if let Some(hit) = self.cache.get(wallet_address).await {
            return Ok(Some(hit));
        }

        let record = self.inner.get_user_by_wallet(wallet_address).await?;
        if let Some(record) = &record {
            self.cache.insert(wallet_address.to_owned(), record.clone()).await;
        }

        Ok(record)
    }
}
