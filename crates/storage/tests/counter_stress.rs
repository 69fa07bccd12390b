//! Concurrent access tests for the windowed counter and list operations.
//!
//! These tests exercise `MemoryBackend` under parallel load to detect lost
//! updates in the two compound operations the gateway depends on:
//! increment-with-window and push-then-trim.

#![allow(clippy::expect_used, clippy::panic)]

use std::time::Duration;

use tokio::task::JoinSet;
use walletgate_storage::{MemoryBackend, StorageBackend};

/// Window length long enough that no reset can occur mid-test.
const WINDOW: Duration = Duration::from_secs(3600);

// ---------------------------------------------------------------------------
// Increment-with-window
// ---------------------------------------------------------------------------

/// Firing `2 * max` simultaneous increments on a fresh key must produce
/// exactly the counts `1..=2*max` — every increment observed, none lost,
/// and exactly `max` of them at or below the limit.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_increments_yield_exact_counts() {
    let backend = MemoryBackend::new();
    let max = 5u64;
    let total = 2 * max;

    let mut set = JoinSet::new();
    for _ in 0..total {
        let backend = backend.clone();
        set.spawn(async move { backend.incr_with_window(b"stress", WINDOW).await });
    }

    let mut counts = Vec::new();
    while let Some(result) = set.join_next().await {
        counts.push(result.expect("task should not panic").expect("increment should succeed"));
    }

    counts.sort_unstable();
    let expected: Vec<u64> = (1..=total).collect();
    assert_eq!(counts, expected, "each increment must observe a distinct count");

    let allowed = counts.iter().filter(|&&c| c <= max).count() as u64;
    assert_eq!(allowed, max, "exactly max of the 2*max increments are within the limit");
}

/// Concurrent increments on a fresh key must agree on a single window:
/// no two tasks may both observe count 1.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_increments_elect_one_window_start() {
    for round in 0..20 {
        let backend = MemoryBackend::new();
        let key = format!("fresh-{round}").into_bytes();

        let mut set = JoinSet::new();
        for _ in 0..8 {
            let backend = backend.clone();
            let key = key.clone();
            set.spawn(async move { backend.incr_with_window(&key, WINDOW).await });
        }

        let mut ones = 0usize;
        while let Some(result) = set.join_next().await {
            let count = result.expect("no panic").expect("increment should succeed");
            if count == 1 {
                ones += 1;
            }
        }

        assert_eq!(ones, 1, "round {round}: exactly one task defines the window start");
    }
}

/// Increments against distinct keys never interfere.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_increments_distinct_keys_independent() {
    let backend = MemoryBackend::new();

    let mut set = JoinSet::new();
    for key_id in 0..10 {
        let backend = backend.clone();
        set.spawn(async move {
            let key = format!("subject-{key_id}").into_bytes();
            let mut last = 0;
            for _ in 0..50 {
                last = backend.incr_with_window(&key, WINDOW).await.expect("increment");
            }
            last
        });
    }

    while let Some(result) = set.join_next().await {
        let final_count = result.expect("task should not panic");
        assert_eq!(final_count, 50, "each key counts its own increments only");
    }
}

// ---------------------------------------------------------------------------
// Push-then-trim
// ---------------------------------------------------------------------------

/// Concurrent push-then-trim appends never leave the list longer than the
/// cap, and every retained entry is one of the pushed values.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_push_trim_respects_cap() {
    let backend = MemoryBackend::new();
    let cap = 100usize;

    let mut set = JoinSet::new();
    for task_id in 0..8 {
        let backend = backend.clone();
        set.spawn(async move {
            for i in 0..50 {
                backend
                    .list_push(
                        b"audit".to_vec(),
                        format!("task{task_id}-entry{i}").into_bytes(),
                        Some(cap),
                    )
                    .await
                    .expect("push should succeed");
            }
        });
    }

    while let Some(result) = set.join_next().await {
        result.expect("task should not panic");
    }

    let entries = backend.list_range(b"audit", usize::MAX).await.expect("range");
    assert_eq!(entries.len(), cap, "400 pushes trimmed to the cap");
    for entry in &entries {
        let s = String::from_utf8(entry.to_vec()).expect("valid utf-8");
        assert!(s.starts_with("task"), "entry must come from a writer task, got: {s}");
    }
}
