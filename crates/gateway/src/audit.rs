//! Authentication audit trail.
//!
//! Every security-relevant outcome — successful connects, 401/403
//! rejections, permission denials, disconnects — is appended to a
//! per-wallet audit log before the response completes. Audit completeness
//! for these events is a correctness requirement, not best-effort
//! telemetry.
//!
//! The log is bounded: only the [`AUDIT_LOG_CAP`] most recent entries per
//! wallet are retained, oldest trimmed. Push and trim are a single atomic
//! store operation, so concurrent appends never grow the log past the cap.

use std::{collections::BTreeMap, fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use walletgate_storage::{StorageBackend, StorageError};

use crate::error::{AuthError, Result};

/// Most-recent entries retained per wallet.
pub const AUDIT_LOG_CAP: usize = 100;

fn log_key(wallet_address: &str) -> Vec<u8> {
    format!("audit_log:{wallet_address}").into_bytes()
}

/// The audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A wallet authentication attempt.
    WalletConnect,
    /// An explicit session disconnect.
    WalletDisconnect,
    /// A post-authentication permission check.
    PermissionCheck,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WalletConnect => write!(f, "WALLET_CONNECT"),
            Self::WalletDisconnect => write!(f, "WALLET_DISCONNECT"),
            Self::PermissionCheck => write!(f, "PERMISSION_CHECK"),
        }
    }
}

/// Outcome of the audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    /// The operation succeeded.
    Success,
    /// The operation was rejected.
    Failure,
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Failure => write!(f, "FAILURE"),
        }
    }
}

/// Request metadata attached to every entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    /// Client IP address.
    pub ip_address: String,
    /// Client `User-Agent` header.
    pub user_agent: String,
    /// Session id, or `unknown` when no session was established.
    pub session_id: String,
}

/// One audit record.
///
/// Built via the generated builder; `timestamp` defaults to now and
/// `details` defaults to empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct AuditEntry {
    /// When the event occurred (defaults to now).
    #[builder(default = Utc::now())]
    pub timestamp: DateTime<Utc>,
    /// The audited operation.
    pub action: AuditAction,
    /// Internal user id, or `unknown` before identity resolution.
    #[builder(into)]
    pub user_id: String,
    /// Wallet address, or `unknown` before credential parsing.
    #[builder(into)]
    pub wallet_address: String,
    /// Outcome.
    pub status: AuditStatus,
    /// Additional context (error codes, permission names).
    #[builder(default)]
    pub details: BTreeMap<String, String>,
    /// Request metadata.
    pub metadata: RequestMetadata,
}

/// Append-only, bounded per-wallet audit log.
pub struct AuditLog {
    backend: Arc<dyn StorageBackend>,
    cap: usize,
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog").field("cap", &self.cap).finish_non_exhaustive()
    }
}

impl AuditLog {
    /// Creates an audit log with the standard retention cap.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend, cap: AUDIT_LOG_CAP }
    }

    /// Appends an entry, trimming the wallet's log to the cap.
    ///
    /// The append completes before this returns; callers awaiting it get
    /// the durability guarantee the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if serialization or the store write
    /// fails.
    #[tracing::instrument(
        skip(self, entry),
        fields(
            wallet = %entry.wallet_address,
            action = %entry.action,
            status = %entry.status,
        )
    )]
    pub async fn append(&self, entry: &AuditEntry) -> Result<()> {
        let bytes = serde_json::to_vec(entry).map_err(|e| {
            AuthError::Store(StorageError::serialization_with_source("audit encode failed", e))
        })?;

        self.backend.list_push(log_key(&entry.wallet_address), bytes, Some(self.cap)).await?;

        tracing::info!(
            audit.timestamp = %entry.timestamp.to_rfc3339(),
            audit.user_id = %entry.user_id,
            audit.session_id = %entry.metadata.session_id,
            "audit_entry"
        );

        Ok(())
    }

    /// Reads up to `limit` entries for a wallet, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the read fails or an entry does not
    /// decode.
    pub async fn recent(&self, wallet_address: &str, limit: usize) -> Result<Vec<AuditEntry>> {
        let raw = self.backend.list_range(&log_key(wallet_address), limit).await?;

        raw.iter()
            .map(|bytes| {
                serde_json::from_slice(bytes).map_err(|e| {
                    AuthError::Store(StorageError::serialization_with_source(
                        "audit decode failed",
                        e,
                    ))
                })
            })
            .collect()
    }
}
