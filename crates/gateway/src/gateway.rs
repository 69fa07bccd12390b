//! The authentication pipeline orchestrator.
//!
//! [`AuthGateway`] composes the rate limiter, credential parser, signature
//! verifier, ban list, user directory, context store and audit/violation
//! sinks into the request pipeline:
//!
//! ```text
//! rate limit ─ fail → 429 (not audited)
//!   └─ parse credentials ─ fail → 401
//!        └─ verify signature ─ fail → 401 + violation
//!             └─ ban check ─ banned → 403
//!                  └─ resolve identity ─ unknown → 401
//!                       └─ issue context → audit SUCCESS → attach
//! ```
//!
//! Every 401/403 rejection writes a FAILURE audit entry before the caller
//! sees the error; 400-class and 429 rejections do not. Stage order is a
//! security property: the ban check runs strictly after signature
//! verification and before identity resolution, so a banned wallet learns
//! nothing beyond the generic suspension error.
//!
//! All collaborating services are constructed once at process start and
//! injected here — there is no hidden module-level state, and tests build
//! isolated instances via [`AuthGateway::from_parts`].

use std::{collections::BTreeMap, sync::Arc};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use walletgate_storage::{StorageBackend, UserDirectory};

use crate::{
    audit::{AuditAction, AuditEntry, AuditLog, AuditStatus, RequestMetadata},
    ban::BanList,
    context::{ClientMetadata, CreateContextParams, SecurityContext, SecurityContextStore},
    credentials::BearerCredentials,
    error::{AuthError, Result},
    rate_limit::{ActionKind, RateLimiter},
    signature::verify_detached,
    violation::{Severity, Violation, ViolationKind, ViolationReporter},
};

/// Placeholder identity for audit entries written before the wallet or
/// user is known.
const UNKNOWN: &str = "unknown";

/// An inbound request, as seen by the gateway.
///
/// Transport-agnostic: the HTTP adapter extracts these fields from the
/// request before calling in.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    /// The raw `Authorization` header value, if present.
    pub authorization: Option<String>,
    /// Client IP address (rate-limit subject for connection attempts).
    pub client_ip: String,
    /// Client `User-Agent` header, or empty.
    pub user_agent: String,
}

/// The identity attached to a request after successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    /// The authenticated wallet.
    pub wallet_address: String,
    /// Resolved internal user id.
    pub user_id: String,
    /// The freshly issued security context.
    pub context: SecurityContext,
}

/// Orchestrates the authentication pipeline.
pub struct AuthGateway {
    limiter: RateLimiter,
    contexts: SecurityContextStore,
    bans: BanList,
    users: Arc<dyn UserDirectory>,
    audit: AuditLog,
    violations: ViolationReporter,
}

impl std::fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGateway").finish_non_exhaustive()
    }
}

impl AuthGateway {
    /// Builds a gateway with all stateful services over one shared store.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>, users: Arc<dyn UserDirectory>) -> Self {
        Self {
            limiter: RateLimiter::new(backend.clone()),
            contexts: SecurityContextStore::new(backend.clone()),
            bans: BanList::new(backend.clone()),
            users,
            audit: AuditLog::new(backend.clone()),
            violations: ViolationReporter::new(backend),
        }
    }

    /// Builds a gateway from individually constructed services.
    ///
    /// The dependency-injection seam: tests use it for short TTLs and
    /// narrow rate windows, deployments for per-service store tuning.
    #[must_use]
    pub fn from_parts(
        limiter: RateLimiter,
        contexts: SecurityContextStore,
        bans: BanList,
        users: Arc<dyn UserDirectory>,
        audit: AuditLog,
        violations: ViolationReporter,
    ) -> Self {
        Self { limiter, contexts, bans, users, audit, violations }
    }

    /// The audit log shared by the pipeline.
    #[must_use]
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// The violation reporter shared by the pipeline.
    #[must_use]
    pub fn violations(&self) -> &ViolationReporter {
        &self.violations
    }

    /// The context store shared by the pipeline.
    #[must_use]
    pub fn contexts(&self) -> &SecurityContextStore {
        &self.contexts
    }

    /// The ban list shared by the pipeline.
    #[must_use]
    pub fn bans(&self) -> &BanList {
        &self.bans
    }

    /// Authenticates a request, issuing a fresh security context on success.
    ///
    /// # Errors
    ///
    /// Every rejection maps to exactly one stable error code; see
    /// [`AuthError::code`]. Infrastructure failures surface as
    /// [`AuthError::Store`], except in the rate limiter, which fails closed
    /// to [`AuthError::RateLimited`].
    #[tracing::instrument(skip(self, request), fields(client_ip = %request.client_ip))]
    pub async fn authenticate(&self, request: &AuthRequest) -> Result<AuthenticatedIdentity> {
        if !self.limiter.check_and_increment(&request.client_ip, ActionKind::WalletConnect).await {
            return Err(AuthError::rate_limited());
        }

        let Some(header) = request.authorization.as_deref() else {
            return Err(self.reject(request, None, AuthError::missing_credentials()).await);
        };

        let credentials = match BearerCredentials::from_header(header) {
            Ok(credentials) => credentials,
            Err(error) => return Err(self.reject(request, None, error).await),
        };
        let wallet = credentials.wallet_address.as_str();

        // A signature that fails base64 decoding is just an invalid
        // signature; only the wallet key itself distinguishes malformed
        // from mismatched.
        let signature = BASE64_STANDARD.decode(&credentials.signature_b64).unwrap_or_default();
        match verify_detached(wallet, credentials.message.as_bytes(), &signature) {
            Ok(true) => {},
            Ok(false) => {
                self.report_signature_violation(&credentials, "signature does not match message")
                    .await?;
                return Err(self.reject(request, Some(wallet), AuthError::invalid_signature()).await);
            },
            Err(error) => {
                self.report_signature_violation(&credentials, "malformed wallet public key")
                    .await?;
                return Err(self.reject(request, Some(wallet), error).await);
            },
        }

        match self.bans.is_banned(wallet).await {
            Ok(false) => {},
            Ok(true) => {
                return Err(self.reject(request, Some(wallet), AuthError::account_suspended()).await);
            },
            Err(error) => return Err(error),
        }

        let user = match self.users.get_user_by_wallet(wallet).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                return Err(self.reject(request, Some(wallet), AuthError::user_not_found(wallet)).await);
            },
            Err(error) => return Err(error.into()),
        };

        let context = self
            .contexts
            .create(CreateContextParams {
                user_id: user.id.clone(),
                wallet_address: credentials.wallet_address.clone(),
                permissions: user.permissions.clone(),
                client: ClientMetadata {
                    user_agent: request.user_agent.clone(),
                    ip_address: request.client_ip.clone(),
                },
            })
            .await?;

        let entry = AuditEntry::builder()
            .action(AuditAction::WalletConnect)
            .user_id(user.id.as_str())
            .wallet_address(wallet)
            .status(AuditStatus::Success)
            .metadata(RequestMetadata {
                ip_address: request.client_ip.clone(),
                user_agent: request.user_agent.clone(),
                session_id: context.session_id.clone(),
            })
            .build();
        self.audit.append(&entry).await?;

        tracing::debug!(
            wallet,
            user_id = %user.id,
            session_id = %context.session_id,
            "wallet authenticated"
        );

        Ok(AuthenticatedIdentity {
            wallet_address: credentials.wallet_address,
            user_id: user.id,
            context,
        })
    }

    /// Looks up a live session.
    ///
    /// Returns `Ok(None)` for unknown, revoked or expired sessions.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] on store failure.
    pub async fn session(&self, session_id: &str) -> Result<Option<SecurityContext>> {
        self.contexts.get(session_id).await
    }

    /// Disconnects a session: revokes the stored context, then audits.
    ///
    /// Revocation is explicit — a disconnected session id stops
    /// authorizing immediately rather than remaining valid for the rest of
    /// its TTL. Disconnecting an unknown or expired session still audits.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] on store failure.
    #[tracing::instrument(skip(self, request))]
    pub async fn disconnect(&self, session_id: &str, request: &AuthRequest) -> Result<()> {
        let context = self.contexts.get(session_id).await?;
        self.contexts.revoke(session_id).await?;

        let (user_id, wallet_address) = context
            .map(|c| (c.user_id, c.wallet_address))
            .unwrap_or_else(|| (UNKNOWN.to_owned(), UNKNOWN.to_owned()));

        let entry = AuditEntry::builder()
            .action(AuditAction::WalletDisconnect)
            .user_id(user_id)
            .wallet_address(wallet_address)
            .status(AuditStatus::Success)
            .metadata(RequestMetadata {
                ip_address: request.client_ip.clone(),
                user_agent: request.user_agent.clone(),
                session_id: session_id.to_owned(),
            })
            .build();
        self.audit.append(&entry).await?;

        Ok(())
    }

    /// Writes the FAILURE audit entry for a security-relevant rejection,
    /// then hands the rejection back.
    ///
    /// Non-security rejections pass through untouched. If the audit write
    /// itself fails, the store error replaces the rejection: a 401/403 must
    /// not be reported to the caller without its durable record.
    async fn reject(
        &self,
        request: &AuthRequest,
        wallet: Option<&str>,
        error: AuthError,
    ) -> AuthError {
        if !error.is_security_event() {
            return error;
        }

        let mut details = BTreeMap::new();
        details.insert("error".to_owned(), error.to_string());
        details.insert("code".to_owned(), error.code().to_string());

        let entry = AuditEntry::builder()
            .action(AuditAction::WalletConnect)
            .user_id(UNKNOWN)
            .wallet_address(wallet.unwrap_or(UNKNOWN))
            .status(AuditStatus::Failure)
            .details(details)
            .metadata(RequestMetadata {
                ip_address: request.client_ip.clone(),
                user_agent: request.user_agent.clone(),
                session_id: UNKNOWN.to_owned(),
            })
            .build();

        match self.audit.append(&entry).await {
            Ok(()) => error,
            Err(audit_error) => {
                tracing::error!(
                    rejection = %error,
                    error = %audit_error,
                    "failed to record security audit entry"
                );
                audit_error
            },
        }
    }

    async fn report_signature_violation(
        &self,
        credentials: &BearerCredentials,
        reason: &str,
    ) -> Result<()> {
        let mut details = BTreeMap::new();
        details.insert("wallet_address".to_owned(), credentials.wallet_address.clone());
        details.insert("message".to_owned(), credentials.message.clone());
        details.insert("reason".to_owned(), reason.to_owned());

        let violation = Violation::builder()
            .kind(ViolationKind::InvalidSignature)
            .severity(Severity::High)
            .details(details)
            .build();

        self.violations.report(&violation).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use walletgate_storage::{MemoryBackend, MemoryUserDirectory, UserRecord};

    use super::*;
    use crate::testutil::TestWallet;

    fn request_with(header: Option<String>) -> AuthRequest {
        AuthRequest {
            authorization: header,
            client_ip: "10.0.0.1".into(),
            user_agent: "test-agent/1.0".into(),
        }
    }

    fn gateway_with_user(wallet: &TestWallet) -> AuthGateway {
        let directory = MemoryUserDirectory::new();
        directory.insert(UserRecord::new("user-1", wallet.address.clone()));
        AuthGateway::new(Arc::new(MemoryBackend::new()), Arc::new(directory))
    }

    #[tokio::test]
    async fn test_successful_authentication_attaches_identity() {
        let wallet = TestWallet::generate();
        let gateway = gateway_with_user(&wallet);

        let request = request_with(Some(wallet.bearer("Sign in")));
        let identity = gateway.authenticate(&request).await.unwrap();

        assert_eq!(identity.wallet_address, wallet.address);
        assert_eq!(identity.user_id, "user-1");
        assert_eq!(identity.context.client.ip_address, "10.0.0.1");
        assert!(identity.context.has_permission("user"));

        // Context is live in the store
        let stored = gateway.session(&identity.context.session_id).await.unwrap().unwrap();
        assert_eq!(stored, identity.context);
    }

    #[tokio::test]
    async fn test_success_writes_audit_entry() {
        let wallet = TestWallet::generate();
        let gateway = gateway_with_user(&wallet);

        let request = request_with(Some(wallet.bearer("Sign in")));
        let identity = gateway.authenticate(&request).await.unwrap();

        let entries = gateway.audit().recent(&wallet.address, 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, AuditStatus::Success);
        assert_eq!(entries[0].action, AuditAction::WalletConnect);
        assert_eq!(entries[0].metadata.session_id, identity.context.session_id);
    }

    #[tokio::test]
    async fn test_missing_header_is_audited() {
        let wallet = TestWallet::generate();
        let gateway = gateway_with_user(&wallet);

        let result = gateway.authenticate(&request_with(None)).await;
        assert!(matches!(result, Err(AuthError::MissingCredentials)));

        let entries = gateway.audit().recent(UNKNOWN, 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, AuditStatus::Failure);
        assert_eq!(entries[0].details["code"], "AUTH_MISSING");
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_rejected() {
        let wallet = TestWallet::generate();
        let gateway = gateway_with_user(&wallet);

        let result =
            gateway.authenticate(&request_with(Some("Basic dXNlcg==".into()))).await;
        assert!(matches!(result, Err(AuthError::InvalidScheme { .. })));
    }

    #[tokio::test]
    async fn test_unknown_user_rejected_after_valid_signature() {
        let signer = TestWallet::generate();
        // Directory knows nobody
        let gateway =
            AuthGateway::new(Arc::new(MemoryBackend::new()), Arc::new(MemoryUserDirectory::new()));

        let result = gateway.authenticate(&request_with(Some(signer.bearer("hi")))).await;
        assert!(matches!(result, Err(AuthError::UserNotFound { .. })));

        // Audited under the wallet address, not "unknown"
        let entries = gateway.audit().recent(&signer.address, 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].details["code"], "AUTH_USER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_disconnect_revokes_and_audits() {
        let wallet = TestWallet::generate();
        let gateway = gateway_with_user(&wallet);

        let request = request_with(Some(wallet.bearer("Sign in")));
        let identity = gateway.authenticate(&request).await.unwrap();
        let session_id = identity.context.session_id;

        gateway.disconnect(&session_id, &request).await.unwrap();

        assert!(gateway.session(&session_id).await.unwrap().is_none());

        let entries = gateway.audit().recent(&wallet.address, 10).await.unwrap();
        assert_eq!(entries[0].action, AuditAction::WalletDisconnect);
        assert_eq!(entries[0].status, AuditStatus::Success);
    }

    #[tokio::test]
    async fn test_disconnect_unknown_session_still_audits() {
        let wallet = TestWallet::generate();
        let gateway = gateway_with_user(&wallet);
        let request = request_with(None);

        gateway.disconnect("no-such-session", &request).await.unwrap();

        let entries = gateway.audit().recent(UNKNOWN, 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::WalletDisconnect);
    }
}
