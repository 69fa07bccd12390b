//! Fixed-window rate limiting per (subject, action) pair.
//!
//! Each [`ActionKind`] maps to a fixed `{window, max}` policy known at
//! compile time; there are no stringly-typed action names. Counters live in
//! the storage backend behind
//! [`incr_with_window`](walletgate_storage::StorageBackend::incr_with_window),
//! so the reset-and-first-increment of a new window is a single atomic
//! store operation shared by every gateway replica.
//!
//! # Failure Policy
//!
//! The limiter fails **closed**: if the counter store is unreachable or
//! times out, the request is treated as not allowed. Failing open would
//! silently disable brute-force protection exactly when an attacker can
//! induce the outage. Store-caused denials are logged at WARN so operators
//! can tell them apart from organic rejections.

use std::{sync::Arc, time::Duration};

use walletgate_storage::StorageBackend;

/// Action categories subject to rate limiting.
///
/// A closed enumeration: adding an action means adding a variant and its
/// policy here, not a config key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Catch-all budget across all endpoints.
    Global,
    /// Wallet connect / authentication attempts.
    WalletConnect,
    /// Image generation requests.
    Generation,
    /// NFT minting requests.
    Minting,
    /// Token transfer transactions.
    TokenTransfer,
}

impl ActionKind {
    /// Every action kind, for startup validation and iteration.
    pub const ALL: &[ActionKind] = &[
        ActionKind::Global,
        ActionKind::WalletConnect,
        ActionKind::Generation,
        ActionKind::Minting,
        ActionKind::TokenTransfer,
    ];

    /// The wire name of this action, used in counter keys and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "GLOBAL",
            Self::WalletConnect => "WALLET_CONNECT",
            Self::Generation => "AI_GENERATION",
            Self::Minting => "NFT_MINTING",
            Self::TokenTransfer => "TOKEN_TRANSACTION",
        }
    }

    /// The fixed rate policy for this action.
    #[must_use]
    pub fn policy(self) -> RatePolicy {
        match self {
            Self::Global => RatePolicy { window: Duration::from_secs(15 * 60), max: 100 },
            Self::WalletConnect => RatePolicy { window: Duration::from_secs(60), max: 5 },
            Self::Generation => RatePolicy { window: Duration::from_secs(60), max: 10 },
            Self::Minting => RatePolicy { window: Duration::from_secs(60), max: 3 },
            Self::TokenTransfer => RatePolicy { window: Duration::from_secs(60), max: 5 },
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fixed-window rate policy: at most `max` operations per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    /// Window length.
    pub window: Duration,
    /// Maximum operations allowed within one window.
    pub max: u64,
}

/// Fixed-window rate limiter over a shared counter store.
pub struct RateLimiter {
    backend: Arc<dyn StorageBackend>,
    overrides: Vec<(ActionKind, RatePolicy)>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").field("overrides", &self.overrides).finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Creates a limiter over the given counter store.
    ///
    /// # Panics
    ///
    /// Panics if any action policy is degenerate (zero window or zero max).
    /// Policies are compile-time constants, so this only fires on a broken
    /// policy table.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        for action in ActionKind::ALL {
            let policy = action.policy();
            assert!(policy.max >= 1, "{action}: max must be at least 1");
            assert!(!policy.window.is_zero(), "{action}: window must be non-zero");
        }
        Self { backend, overrides: Vec::new() }
    }

    /// Replaces the policy for one action.
    ///
    /// Intended for tests that need short windows; production uses the
    /// fixed table in [`ActionKind::policy`].
    ///
    /// # Panics
    ///
    /// Panics if the override is degenerate.
    #[must_use]
    pub fn with_policy(mut self, action: ActionKind, policy: RatePolicy) -> Self {
        assert!(policy.max >= 1, "{action}: max must be at least 1");
        assert!(!policy.window.is_zero(), "{action}: window must be non-zero");
        self.overrides.retain(|(a, _)| *a != action);
        self.overrides.push((action, policy));
        self
    }

    fn effective_policy(&self, action: ActionKind) -> RatePolicy {
        self.overrides
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, p)| *p)
            .unwrap_or_else(|| action.policy())
    }

    fn counter_key(subject: &str, action: ActionKind) -> Vec<u8> {
        format!("rate_limit:{action}:{subject}").into_bytes()
    }

    /// Consumes one slot for `(subject, action)` and reports whether the
    /// caller is within the limit.
    ///
    /// The decision is `count <= max` evaluated *after* incrementing: the
    /// call that pushes the counter past the limit is itself rejected but
    /// still consumes a slot, so rejected retries are not free.
    ///
    /// Fails closed: any store failure is reported as not allowed.
    #[tracing::instrument(skip(self))]
    pub async fn check_and_increment(&self, subject: &str, action: ActionKind) -> bool {
        let policy = self.effective_policy(action);
        let key = Self::counter_key(subject, action);

        match self.backend.incr_with_window(&key, policy.window).await {
            Ok(count) => {
                let allowed = count <= policy.max;
                if !allowed {
                    tracing::debug!(subject, action = %action, count, max = policy.max, "rate limit exceeded");
                }
                allowed
            },
            Err(error) => {
                tracing::warn!(
                    subject,
                    action = %action,
                    error = %error,
                    "rate limit store unavailable; failing closed"
                );
                false
            },
        }
    }
}
