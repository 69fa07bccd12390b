//! TTL boundary condition tests for `MemoryBackend`.
//!
//! Covers edge cases in TTL behavior: zero TTL, large TTL, expiration
//! visibility, and TTL clearing via `set`.

#![allow(clippy::expect_used, clippy::panic)]

use std::time::Duration;

use bytes::Bytes;
use walletgate_storage::{MemoryBackend, StorageBackend};

/// A key set with `Duration::ZERO` TTL is considered immediately expired.
///
/// The backend stores `Instant::now() + ttl` as the expiry; with a zero
/// duration any subsequent read sees the key as expired and returns `None`.
#[tokio::test]
async fn test_zero_ttl_is_immediately_expired() {
    let backend = MemoryBackend::new();

    backend
        .set_with_ttl(b"zero-ttl".to_vec(), b"ephemeral".to_vec(), Duration::ZERO)
        .await
        .expect("set_with_ttl with zero duration should succeed");

    let result = backend.get(b"zero-ttl").await.expect("get should not error");
    assert_eq!(result, None, "a key with zero TTL should be immediately expired on the next read");
}

/// A key with a very large TTL must not overflow or panic.
#[tokio::test]
async fn test_large_ttl_no_overflow() {
    let backend = MemoryBackend::new();

    // ~100 years — large enough to exercise overflow concerns but small
    // enough to not panic on Instant addition.
    let hundred_years = Duration::from_secs(100 * 365 * 24 * 3600);

    backend
        .set_with_ttl(b"long-lived".to_vec(), b"value".to_vec(), hundred_years)
        .await
        .expect("set_with_ttl with large TTL should succeed");

    let result = backend.get(b"long-lived").await.expect("get");
    assert_eq!(result, Some(Bytes::from("value")));
}

/// Expiry is visible on read before the background sweeper removes the key.
#[tokio::test]
async fn test_expiry_hidden_before_physical_cleanup() {
    let backend = MemoryBackend::new();

    backend
        .set_with_ttl(b"short".to_vec(), b"value".to_vec(), Duration::from_millis(30))
        .await
        .expect("set_with_ttl");

    // Well before the 1-second sweeper interval.
    tokio::time::sleep(Duration::from_millis(60)).await;

    let result = backend.get(b"short").await.expect("get");
    assert_eq!(result, None, "expired key must be hidden even if not yet swept");
}

/// A plain `set` on a TTL-bearing key clears the TTL.
#[tokio::test]
async fn test_set_clears_existing_ttl() {
    let backend = MemoryBackend::new();

    backend
        .set_with_ttl(b"key".to_vec(), b"short-lived".to_vec(), Duration::from_millis(30))
        .await
        .expect("set_with_ttl");
    backend.set(b"key".to_vec(), b"durable".to_vec()).await.expect("set");

    tokio::time::sleep(Duration::from_millis(60)).await;

    let result = backend.get(b"key").await.expect("get");
    assert_eq!(result, Some(Bytes::from("durable")));
}

/// Re-setting with a new TTL replaces the old expiry.
#[tokio::test]
async fn test_ttl_replacement_extends_lifetime() {
    let backend = MemoryBackend::new();

    backend
        .set_with_ttl(b"key".to_vec(), b"v1".to_vec(), Duration::from_millis(30))
        .await
        .expect("first set_with_ttl");
    backend
        .set_with_ttl(b"key".to_vec(), b"v2".to_vec(), Duration::from_secs(60))
        .await
        .expect("second set_with_ttl");

    tokio::time::sleep(Duration::from_millis(60)).await;

    let result = backend.get(b"key").await.expect("get");
    assert_eq!(result, Some(Bytes::from("v2")), "replacement TTL should govern");
}

/// Delete removes both the value and its TTL entry.
#[tokio::test]
async fn test_delete_removes_ttl_key() {
    let backend = MemoryBackend::new();

    backend
        .set_with_ttl(b"key".to_vec(), b"value".to_vec(), Duration::from_secs(60))
        .await
        .expect("set_with_ttl");
    backend.delete(b"key").await.expect("delete");

    let result = backend.get(b"key").await.expect("get");
    assert_eq!(result, None);

    // Re-setting without TTL must not inherit the old expiry.
    backend.set(b"key".to_vec(), b"fresh".to_vec()).await.expect("set");
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(backend.get(b"key").await.expect("get"), Some(Bytes::from("fresh")));
}
