//! User lookup collaborator boundary.
//!
//! The gateway resolves a wallet address to an internal user record through
//! [`UserDirectory`]. User lifecycle (creation, permission grants, deletion)
//! is owned by the profile service behind this trait — the gateway only
//! reads.
//!
//! [`MemoryUserDirectory`] provides an in-memory implementation for tests
//! and development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;

/// Internal user record resolved from a wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Stable internal identifier.
    pub id: String,
    /// The wallet public key this record belongs to.
    pub wallet_address: String,
    /// Permission names granted to the user.
    pub permissions: Vec<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Creates a record with the default `user` permission.
    #[must_use]
    pub fn new(id: impl Into<String>, wallet_address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            wallet_address: wallet_address.into(),
            permissions: vec!["user".to_owned()],
            created_at: Utc::now(),
        }
    }

    /// Replaces the permission set.
    #[must_use]
    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }
}

/// Read-only lookup of user records by wallet address.
///
/// Implementations are expected to be thread-safe and to return `Ok(None)`
/// for unknown wallets rather than an error.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolves a wallet address to its user record, if one exists.
    #[must_use = "lookup results decide whether authentication proceeds"]
    async fn get_user_by_wallet(&self, wallet_address: &str) -> StorageResult<Option<UserRecord>>;
}

/// In-memory [`UserDirectory`] for tests and development.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryUserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user record, keyed by wallet address.
    pub fn insert(&self, record: UserRecord) {
        self.users.write().insert(record.wallet_address.clone(), record);
    }

    /// Removes the record for a wallet address.
    pub fn remove(&self, wallet_address: &str) {
        self.users.write().remove(wallet_address);
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn get_user_by_wallet(&self, wallet_address: &str) -> StorageResult<Option<UserRecord>> {
        Ok(self.users.read().get(wallet_address).cloned())
    }
}
