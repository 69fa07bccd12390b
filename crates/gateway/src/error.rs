//! Gateway error types.
//!
//! Every rejection produced by the authentication pipeline maps to exactly
//! one stable [`ErrorCode`] with a fixed HTTP status class. The codes are
//! the boundary contract — transport adapters translate them, they never
//! invent their own.

use thiserror::Error;
use walletgate_storage::StorageError;

use crate::validation::FieldError;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Stable error codes surfaced at the service boundary.
///
/// Each code is bound to a fixed HTTP status class; see
/// [`http_status`](ErrorCode::http_status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Authorization header missing.
    AuthMissing,
    /// Authorization scheme is not `Bearer`.
    AuthInvalidType,
    /// Bearer credential does not have the expected structure.
    AuthInvalidFormat,
    /// Signature verification failed (or the wallet key is malformed).
    AuthInvalidSignature,
    /// No user record exists for the wallet.
    AuthUserNotFound,
    /// The operation requires an authenticated session.
    AuthRequired,
    /// The session lacks the required permission, or no longer exists.
    AuthForbidden,
    /// The wallet is banned.
    AccountSuspended,
    /// Too many requests for the action's window.
    RateLimitExceeded,
    /// Structural schema validation failed.
    ValidationError,
    /// Request content matched a blocking security rule.
    InvalidContent,
    /// Infrastructure failure (store unreachable, serialization fault).
    InternalError,
}

impl ErrorCode {
    /// The wire representation of this code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthMissing => "AUTH_MISSING",
            Self::AuthInvalidType => "AUTH_INVALID_TYPE",
            Self::AuthInvalidFormat => "AUTH_INVALID_FORMAT",
            Self::AuthInvalidSignature => "AUTH_INVALID_SIGNATURE",
            Self::AuthUserNotFound => "AUTH_USER_NOT_FOUND",
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::AuthForbidden => "AUTH_FORBIDDEN",
            Self::AccountSuspended => "ACCOUNT_SUSPENDED",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidContent => "INVALID_CONTENT",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// The fixed HTTP status for this code.
    #[must_use]
    pub fn http_status(self) -> u16 {
        match self {
            Self::AuthMissing
            | Self::AuthInvalidType
            | Self::AuthInvalidFormat
            | Self::AuthInvalidSignature
            | Self::AuthUserNotFound
            | Self::AuthRequired => 401,
            Self::AuthForbidden | Self::AccountSuspended => 403,
            Self::RateLimitExceeded => 429,
            Self::ValidationError | Self::InvalidContent => 400,
            Self::InternalError => 500,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication and authorization errors.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// No `Authorization` header was supplied.
    #[error("Authorization header missing")]
    MissingCredentials,

    /// Authorization scheme is not `Bearer`.
    #[error("Invalid authorization type: {scheme}")]
    InvalidScheme {
        /// The scheme that was supplied.
        scheme: String,
    },

    /// Bearer token does not split into wallet, signature and message.
    #[error("Invalid credential format: {reason}")]
    MalformedCredentials {
        /// Why parsing failed.
        reason: String,
    },

    /// The claimed wallet public key cannot be decoded.
    ///
    /// Distinct from [`InvalidSignature`](Self::InvalidSignature) so the
    /// pipeline can short-circuit before attempting verification and record
    /// a clearer audit reason.
    #[error("Malformed wallet public key: {reason}")]
    MalformedIdentity {
        /// Why the key is malformed.
        reason: String,
    },

    /// Signature does not verify against the message and wallet key.
    #[error("Invalid signature")]
    InvalidSignature,

    /// No user record exists for the wallet.
    #[error("User not found for wallet {wallet}")]
    UserNotFound {
        /// The wallet that failed resolution.
        wallet: String,
    },

    /// The operation requires an authenticated session.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The session does not carry the required permission.
    #[error("Insufficient permissions: {permission}")]
    PermissionDenied {
        /// The permission that was required.
        permission: String,
    },

    /// The wallet is banned.
    #[error("Account temporarily suspended")]
    AccountSuspended,

    /// Too many requests within the action's window.
    #[error("Too many requests")]
    RateLimited,

    /// Structural schema validation failed.
    #[error("Validation failed: {}", format_field_errors(.errors))]
    Validation {
        /// Per-field validation failures.
        errors: Vec<FieldError>,
    },

    /// Request content matched a blocking security rule.
    #[error("Invalid request content: matched rule {rule}")]
    BlockedContent {
        /// The rule that matched.
        rule: String,
    },

    /// Storage infrastructure failure.
    ///
    /// Wraps the original [`StorageError`] to preserve the full error source
    /// chain for debugging and structured logging.
    #[error("Store error: {0}")]
    Store(
        /// The underlying storage failure.
        #[source]
        StorageError,
    ),
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors.iter().map(|e| format!("{}: {}", e.field, e.message)).collect::<Vec<_>>().join("; ")
}

impl AuthError {
    /// Creates a `MissingCredentials` error.
    #[must_use]
    pub fn missing_credentials() -> Self {
        Self::MissingCredentials
    }

    /// Creates an `InvalidScheme` error.
    #[must_use]
    pub fn invalid_scheme(scheme: impl Into<String>) -> Self {
        Self::InvalidScheme { scheme: scheme.into() }
    }

    /// Creates a `MalformedCredentials` error.
    #[must_use]
    pub fn malformed_credentials(reason: impl Into<String>) -> Self {
        Self::MalformedCredentials { reason: reason.into() }
    }

    /// Creates a `MalformedIdentity` error.
    #[must_use]
    pub fn malformed_identity(reason: impl Into<String>) -> Self {
        Self::MalformedIdentity { reason: reason.into() }
    }

    /// Creates an `InvalidSignature` error.
    #[must_use]
    pub fn invalid_signature() -> Self {
        Self::InvalidSignature
    }

    /// Creates a `UserNotFound` error.
    #[must_use]
    pub fn user_not_found(wallet: impl Into<String>) -> Self {
        Self::UserNotFound { wallet: wallet.into() }
    }

    /// Creates an `AuthenticationRequired` error.
    #[must_use]
    pub fn authentication_required() -> Self {
        Self::AuthenticationRequired
    }

    /// Creates a `PermissionDenied` error.
    #[must_use]
    pub fn permission_denied(permission: impl Into<String>) -> Self {
        Self::PermissionDenied { permission: permission.into() }
    }

    /// Creates an `AccountSuspended` error.
    #[must_use]
    pub fn account_suspended() -> Self {
        Self::AccountSuspended
    }

    /// Creates a `RateLimited` error.
    #[must_use]
    pub fn rate_limited() -> Self {
        Self::RateLimited
    }

    /// Creates a `Validation` error from accumulated field errors.
    #[must_use]
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation { errors }
    }

    /// Creates a `BlockedContent` error.
    #[must_use]
    pub fn blocked_content(rule: impl Into<String>) -> Self {
        Self::BlockedContent { rule: rule.into() }
    }

    /// The stable error code for this rejection.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingCredentials => ErrorCode::AuthMissing,
            Self::InvalidScheme { .. } => ErrorCode::AuthInvalidType,
            Self::MalformedCredentials { .. } => ErrorCode::AuthInvalidFormat,
            Self::MalformedIdentity { .. } | Self::InvalidSignature => {
                ErrorCode::AuthInvalidSignature
            },
            Self::UserNotFound { .. } => ErrorCode::AuthUserNotFound,
            Self::AuthenticationRequired => ErrorCode::AuthRequired,
            Self::PermissionDenied { .. } => ErrorCode::AuthForbidden,
            Self::AccountSuspended => ErrorCode::AccountSuspended,
            Self::RateLimited => ErrorCode::RateLimitExceeded,
            Self::Validation { .. } => ErrorCode::ValidationError,
            Self::BlockedContent { .. } => ErrorCode::InvalidContent,
            Self::Store(_) => ErrorCode::InternalError,
        }
    }

    /// The HTTP status this rejection maps to.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.code().http_status()
    }

    /// Whether this rejection must be durably audited before the response
    /// completes.
    ///
    /// Authentication and authorization failures (401/403) are security
    /// events; rate limiting, validation failures and infrastructure errors
    /// are not.
    #[must_use]
    pub fn is_security_event(&self) -> bool {
        matches!(self.http_status(), 401 | 403)
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        Self::Store(err)
    }
}
