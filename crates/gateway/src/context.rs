//! Security context issuance and lookup.
//!
//! A [`SecurityContext`] is the server-issued proof that a wallet
//! authenticated successfully, scoped by a permission set. Contexts are
//! immutable once stored: a permission change means issuing a new context,
//! never mutating an existing one. The store hides expired contexts
//! logically; physical deletion is the backend's concern.
//!
//! Session ids come from the OS CSPRNG — 16 random bytes, hex-encoded —
//! so they cannot be guessed or enumerated.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use walletgate_storage::{StorageBackend, StorageError};

use crate::error::{AuthError, Result};

/// Absolute context lifetime: 24 hours from creation.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Random bytes per session id (128 bits).
const SESSION_ID_BYTES: usize = 16;

fn context_key(session_id: &str) -> Vec<u8> {
    format!("security_context:{session_id}").into_bytes()
}

fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Client-supplied request metadata captured at authentication time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    /// The client's `User-Agent` header, or empty.
    pub user_agent: String,
    /// The client's IP address.
    pub ip_address: String,
}

/// A short-lived, server-issued authentication session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    /// Opaque session token.
    pub session_id: String,
    /// The wallet that authenticated.
    pub wallet_address: String,
    /// Internal user id resolved at authentication time.
    pub user_id: String,
    /// Permission names in effect for this session.
    pub permissions: Vec<String>,
    /// Client metadata captured at issuance.
    pub client: ClientMetadata,
    /// When the context was issued.
    pub created_at: DateTime<Utc>,
    /// When the context expires (issuance + [`SESSION_TTL`]).
    pub expires_at: DateTime<Utc>,
}

impl SecurityContext {
    /// Whether the permission set contains `permission`.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Parameters for issuing a new context.
#[derive(Debug, Clone)]
pub struct CreateContextParams {
    /// Internal user id.
    pub user_id: String,
    /// Authenticated wallet address.
    pub wallet_address: String,
    /// Permissions to scope the session to.
    pub permissions: Vec<String>,
    /// Client metadata for the audit trail.
    pub client: ClientMetadata,
}

/// Issues, persists and retrieves [`SecurityContext`]s.
///
/// The store exclusively owns context storage and TTL. There is no update
/// operation; [`revoke`](Self::revoke) is the only mutation after creation.
pub struct SecurityContextStore {
    backend: Arc<dyn StorageBackend>,
    ttl: Duration,
}

impl std::fmt::Debug for SecurityContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityContextStore").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl SecurityContextStore {
    /// Creates a store with the standard 24-hour session TTL.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend, ttl: SESSION_TTL }
    }

    /// Creates a store with a custom TTL. Intended for tests.
    #[must_use]
    pub fn with_ttl(backend: Arc<dyn StorageBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Issues and persists a new context.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if serialization or the store write
    /// fails. Write failures are retryable by the caller; no partial
    /// context is observable.
    pub async fn create(&self, params: CreateContextParams) -> Result<SecurityContext> {
        let now = Utc::now();
        let context = SecurityContext {
            session_id: generate_session_id(),
            wallet_address: params.wallet_address,
            user_id: params.user_id,
            permissions: params.permissions,
            client: params.client,
            created_at: now,
            expires_at: now + chrono::Duration::seconds(self.ttl.as_secs() as i64),
        };

        let bytes = serde_json::to_vec(&context).map_err(|e| {
            AuthError::Store(StorageError::serialization_with_source("context encode failed", e))
        })?;

        self.backend.set_with_ttl(context_key(&context.session_id), bytes, self.ttl).await?;

        tracing::debug!(
            session_id = %context.session_id,
            wallet = %context.wallet_address,
            "security context issued"
        );

        Ok(context)
    }

    /// Retrieves a live context by session id.
    ///
    /// Returns `Ok(None)` for unknown, revoked or expired sessions.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the read fails or the stored bytes
    /// do not decode.
    pub async fn get(&self, session_id: &str) -> Result<Option<SecurityContext>> {
        let Some(bytes) = self.backend.get(&context_key(session_id)).await? else {
            return Ok(None);
        };

        let context = serde_json::from_slice(&bytes).map_err(|e| {
            AuthError::Store(StorageError::serialization_with_source("context decode failed", e))
        })?;

        Ok(Some(context))
    }

    /// Revokes a context, making the session id invalid immediately.
    ///
    /// Revoking an unknown or already-expired session is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the delete fails.
    pub async fn revoke(&self, session_id: &str) -> Result<()> {
        self.backend.delete(&context_key(session_id)).await?;
        tracing::debug!(session_id, "security context revoked");
        Ok(())
    }
}
