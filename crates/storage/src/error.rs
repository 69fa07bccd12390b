//! Storage error types and result alias.
//!
//! This module defines the error types that can occur during store
//! operations. All storage backends must map their internal errors to these
//! standardized error types.
//!
//! # Example
//!
//! ```
//! use walletgate_storage::{StorageError, StorageResult};
//!
//! fn lookup(key: &str) -> StorageResult<Vec<u8>> {
//!     Err(StorageError::not_found(key))
//! }
//! ```

use std::sync::Arc;

use thiserror::Error;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// This enum represents the canonical set of errors that any storage backend
/// can produce. Backend implementations should map their internal error
/// types to these variants.
///
/// Errors preserve their source chain via the `#[source]` attribute,
/// enabling debugging tools to display the full error context.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The requested key was not found in the storage backend.
    #[error("Key not found: {key}")]
    NotFound {
        /// The key that was not found.
        key: String,
    },

    /// Connection or network error.
    ///
    /// Indicates a failure to communicate with the storage backend, such as
    /// a network timeout, DNS failure, or connection refused.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
        /// The underlying error that caused this connection failure.
        #[source]
        source: Option<BoxError>,
    },

    /// Serialization or deserialization error.
    ///
    /// Data cannot be encoded for storage or decoded when retrieved. This
    /// typically indicates data corruption or schema incompatibility.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
        /// The underlying error that caused serialization to fail.
        #[source]
        source: Option<BoxError>,
    },

    /// Internal storage backend error.
    ///
    /// Catch-all for backend-specific errors that don't fit other
    /// categories.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
        /// The underlying error that caused this internal failure.
        #[source]
        source: Option<BoxError>,
    },

    /// Operation timed out.
    ///
    /// The storage operation exceeded its configured time limit.
    #[error("Operation timeout")]
    Timeout,
}

impl StorageError {
    /// Creates a new `NotFound` error for the given key.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates a new `Connection` error with the given message.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None }
    }

    /// Creates a new `Connection` error with a message and source error.
    #[must_use]
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Serialization` error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization { message: message.into(), source: None }
    }

    /// Creates a new `Serialization` error with a message and source error.
    #[must_use]
    pub fn serialization_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Internal` error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Creates a new `Internal` error with a message and source error.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Timeout` error.
    #[must_use]
    pub fn timeout() -> Self {
        Self::Timeout
    }

    /// Returns `true` for errors that may succeed on retry.
    ///
    /// Connection failures and timeouts are transient; everything else
    /// indicates a logic or data problem that a retry will not fix.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("session:abc");
        assert_eq!(err.to_string(), "Key not found: session:abc");

        let err = StorageError::connection("refused");
        assert_eq!(err.to_string(), "Connection error: refused");

        let err = StorageError::timeout();
        assert_eq!(err.to_string(), "Operation timeout");
    }

    #[test]
    fn test_transient_classification() {
        assert!(StorageError::timeout().is_transient());
        assert!(StorageError::connection("reset").is_transient());
        assert!(!StorageError::not_found("k").is_transient());
        assert!(!StorageError::serialization("bad json").is_transient());
        assert!(!StorageError::internal("boom").is_transient());
    }

    #[test]
    fn test_source_chain_preserved() {
        use std::error::Error;

        let inner = StorageError::timeout();
        let err = StorageError::connection_with_source("backend unreachable", inner);

        let source = err.source().expect("source chain must be preserved");
        assert_eq!(source.to_string(), "Operation timeout");
    }

    #[test]
    fn test_nested_source_chain() {
        use std::error::Error;

        let inner: BoxError = Arc::new(StorageError::Timeout);
        let mid = StorageError::Connection { message: "lost".into(), source: Some(inner) };
        let outer = StorageError::internal_with_source("wrapped", mid);

        let level_1 = outer.source().expect("level 1 source");
        assert_eq!(level_1.to_string(), "Connection error: lost");

        let level_2 = level_1.source().expect("level 2 source");
        assert_eq!(level_2.to_string(), "Operation timeout");
    }
}
