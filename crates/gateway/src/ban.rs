//! Banned wallet registry.
//!
//! A ban is a flag keyed by wallet address, checked by the pipeline
//! strictly after signature verification and before identity resolution: a
//! banned wallet learns nothing past the generic suspension error. Ban
//! management (who bans, for how long) is owned by moderation tooling; this
//! component only stores and answers the flag.

use std::{sync::Arc, time::Duration};

use walletgate_storage::StorageBackend;

use crate::error::Result;

fn ban_key(wallet_address: &str) -> Vec<u8> {
    format!("banned_wallet:{wallet_address}").into_bytes()
}

/// Stores and answers banned-wallet flags.
pub struct BanList {
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for BanList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BanList").finish_non_exhaustive()
    }
}

impl BanList {
    /// Creates a ban list over the given store.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Flags a wallet as banned, optionally expiring after `duration`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`](crate::AuthError::Store) if the write
    /// fails.
    pub async fn ban(&self, wallet_address: &str, duration: Option<Duration>) -> Result<()> {
        let key = ban_key(wallet_address);
        match duration {
            Some(ttl) => self.backend.set_with_ttl(key, b"1".to_vec(), ttl).await?,
            None => self.backend.set(key, b"1".to_vec()).await?,
        }
        tracing::info!(wallet = wallet_address, "wallet banned");
        Ok(())
    }

    /// Clears a wallet's ban flag.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`](crate::AuthError::Store) if the delete
    /// fails.
    pub async fn lift(&self, wallet_address: &str) -> Result<()> {
        self.backend.delete(&ban_key(wallet_address)).await?;
        tracing::info!(wallet = wallet_address, "wallet ban lifted");
        Ok(())
    }

    /// Whether the wallet is currently banned.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`](crate::AuthError::Store) if the read
    /// fails.
    pub async fn is_banned(&self, wallet_address: &str) -> Result<bool> {
        Ok(self.backend.get(&ban_key(wallet_address)).await?.is_some())
    }
}
