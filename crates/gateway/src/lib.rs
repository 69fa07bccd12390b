//! # Walletgate Gateway
//!
//! Wallet-based identity and access gateway: callers authenticate by
//! proving control of an Ed25519 wallet key with a detached signature; the
//! gateway issues short-lived security contexts, enforces per-action rate
//! limits, validates request payloads against security rules, and records
//! an immutable audit trail.
//!
//! This crate provides:
//! - **[`AuthGateway`]**: the request pipeline — rate limit, credential parse, signature
//!   verification, ban check, identity resolution, context issuance, audit
//! - **[`PermissionGate`]**: post-authentication permission checks against the live context
//! - **[`RequestValidator`]**: content-security rules plus schema validation
//! - **[`RateLimiter`]**, **[`SecurityContextStore`]**, **[`BanList`]**, **[`AuditLog`]**,
//!   **[`ViolationReporter`]**: the services the pipeline composes
//!
//! All shared state lives behind the
//! [`StorageBackend`](walletgate_storage::StorageBackend) abstraction, so a
//! fleet of gateway replicas sharing one store enforces one set of limits
//! and sees one audit trail.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use walletgate_gateway::{AuthGateway, AuthRequest};
//! use walletgate_storage::{MemoryBackend, MemoryUserDirectory};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(MemoryBackend::new());
//! let users = Arc::new(MemoryUserDirectory::new());
//! let gateway = AuthGateway::new(backend, users);
//!
//! let request = AuthRequest {
//!     authorization: Some("Bearer <wallet>.<signature>.<message>".into()),
//!     client_ip: "203.0.113.7".into(),
//!     user_agent: "example/1.0".into(),
//! };
//!
//! match gateway.authenticate(&request).await {
//!     Ok(identity) => println!("session {}", identity.context.session_id),
//!     Err(error) => println!("{} {}", error.http_status(), error.code()),
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Audit trail types and log.
pub mod audit;
/// Banned wallet registry.
pub mod ban;
/// Security context issuance and lookup.
pub mod context;
/// Bearer credential parsing.
pub mod credentials;
/// Gateway error taxonomy.
pub mod error;
/// The authentication pipeline orchestrator.
pub mod gateway;
/// Post-authentication permission checks.
pub mod permission;
/// Fixed-window rate limiting.
pub mod rate_limit;
/// Detached signature verification.
pub mod signature;
/// Shared test helpers.
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
/// Cached user directory.
pub mod users;
/// Content rules and schema validation.
pub mod validation;
/// Violation reporting.
pub mod violation;

// Re-export key types for convenience
pub use audit::{AUDIT_LOG_CAP, AuditAction, AuditEntry, AuditLog, AuditStatus, RequestMetadata};
pub use ban::BanList;
pub use context::{
    ClientMetadata, CreateContextParams, SESSION_TTL, SecurityContext, SecurityContextStore,
};
pub use credentials::BearerCredentials;
pub use error::{AuthError, ErrorCode, Result};
pub use gateway::{AuthGateway, AuthRequest, AuthenticatedIdentity};
pub use permission::PermissionGate;
pub use rate_limit::{ActionKind, RateLimiter, RatePolicy};
pub use signature::{decode_wallet_address, verify_detached};
pub use users::CachedUserDirectory;
pub use validation::{
    FieldError, RequestValidator, RuleSet, SchemaKind, SecurityRule, ValidatedRequest,
};
pub use violation::{Severity, Violation, ViolationKind, ViolationReporter};
