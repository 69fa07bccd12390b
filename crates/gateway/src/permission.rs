//! Post-authentication permission checks.
//!
//! [`PermissionGate`] authorizes an action against a session's permission
//! set. The context is re-fetched from the store on every check — never
//! trusted from the caller's cached copy — so revocation elsewhere takes
//! effect immediately. A missing context (expired or revoked) and a missing
//! permission are the same answer: Forbidden.

use std::collections::BTreeMap;

use crate::{
    audit::{AuditAction, AuditEntry, AuditLog, AuditStatus, RequestMetadata},
    context::{SecurityContext, SecurityContextStore},
    error::{AuthError, Result},
};

/// Authorizes actions against live session permissions.
pub struct PermissionGate {
    contexts: SecurityContextStore,
    audit: AuditLog,
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate").finish_non_exhaustive()
    }
}

impl PermissionGate {
    /// Creates a gate over the given context store and audit log.
    #[must_use]
    pub fn new(contexts: SecurityContextStore, audit: AuditLog) -> Self {
        Self { contexts, audit }
    }

    /// Requires `permission` for the given session.
    ///
    /// Returns the live context on success so handlers can read identity
    /// fields without a second fetch.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AuthenticationRequired`] when no session id is supplied (401)
    /// - [`AuthError::PermissionDenied`] when the context is missing, revoked, expired, or lacks
    ///   the permission (403) — denials are audited before returning
    /// - [`AuthError::Store`] on store failure
    #[tracing::instrument(skip(self))]
    pub async fn require(
        &self,
        session_id: Option<&str>,
        permission: &str,
    ) -> Result<SecurityContext> {
        let Some(session_id) = session_id else {
            return Err(AuthError::authentication_required());
        };

        let context = self.contexts.get(session_id).await?;

        match context {
            Some(context) if context.has_permission(permission) => Ok(context),
            context => {
                self.audit_denial(session_id, permission, context.as_ref()).await?;
                Err(AuthError::permission_denied(permission))
            },
        }
    }

    async fn audit_denial(
        &self,
        session_id: &str,
        permission: &str,
        context: Option<&SecurityContext>,
    ) -> Result<()> {
        let mut details = BTreeMap::new();
        details.insert("permission".to_owned(), permission.to_owned());
        details.insert("code".to_owned(), "AUTH_FORBIDDEN".to_owned());

        let (user_id, wallet_address, metadata) = match context {
            Some(context) => (
                context.user_id.clone(),
                context.wallet_address.clone(),
                RequestMetadata {
                    ip_address: context.client.ip_address.clone(),
                    user_agent: context.client.user_agent.clone(),
                    session_id: session_id.to_owned(),
                },
            ),
            None => (
                "unknown".to_owned(),
                "unknown".to_owned(),
                RequestMetadata {
                    ip_address: String::new(),
                    user_agent: String::new(),
                    session_id: session_id.to_owned(),
                },
            ),
        };

        let entry = AuditEntry::builder()
            .action(AuditAction::PermissionCheck)
            .user_id(user_id)
            .wallet_address(wallet_address)
            .status(AuditStatus::Failure)
            .details(details)
            .metadata(metadata)
            .build();

        self.audit.append(&entry).await
    }
}
