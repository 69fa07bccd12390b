//! Security violation reporting.
//!
//! Violations are the anomaly-detection feed: bad signatures, rate-limit
//! abuse, suspicious activity. They are recorded independently of the audit
//! trail — a single failed-signature event produces one violation record
//! *and* one FAILURE audit entry, two different concerns that are never
//! merged into one record type.
//!
//! Records are grouped by violation kind under `security_violations:<kind>`
//! with no eviction in this core; retention is the store's concern.

use std::{collections::BTreeMap, fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use walletgate_storage::{StorageBackend, StorageError};

use crate::error::{AuthError, Result};

fn violations_key(kind: ViolationKind) -> Vec<u8> {
    format!("security_violations:{kind}").into_bytes()
}

/// Category of a recorded violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    /// Rate-limit abuse.
    RateLimit,
    /// A signature that failed verification (or a malformed identity).
    InvalidSignature,
    /// An access attempt without authorization.
    Unauthorized,
    /// Behavior matching a suspicious pattern.
    SuspiciousActivity,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::InvalidSignature => write!(f, "INVALID_SIGNATURE"),
            Self::Unauthorized => write!(f, "UNAUTHORIZED"),
            Self::SuspiciousActivity => write!(f, "SUSPICIOUS_ACTIVITY"),
        }
    }
}

/// How severe a violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Informational.
    Low,
    /// Worth watching.
    Medium,
    /// Likely hostile.
    High,
    /// Active attack indicator.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One recorded anomaly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct Violation {
    /// When the violation occurred (defaults to now).
    #[builder(default = Utc::now())]
    pub timestamp: DateTime<Utc>,
    /// Category.
    pub kind: ViolationKind,
    /// Severity.
    pub severity: Severity,
    /// Context (wallet address, offending message, matched rule).
    #[builder(default)]
    pub details: BTreeMap<String, String>,
}

/// Records violations, grouped by kind.
pub struct ViolationReporter {
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for ViolationReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViolationReporter").finish_non_exhaustive()
    }
}

impl ViolationReporter {
    /// Creates a reporter over the given store.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Records a violation and emits a structured warning.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if serialization or the store write
    /// fails.
    pub async fn report(&self, violation: &Violation) -> Result<()> {
        let bytes = serde_json::to_vec(violation).map_err(|e| {
            AuthError::Store(StorageError::serialization_with_source("violation encode failed", e))
        })?;

        self.backend.list_push(violations_key(violation.kind), bytes, None).await?;

        tracing::warn!(
            violation.kind = %violation.kind,
            violation.severity = %violation.severity,
            "security_violation"
        );

        Ok(())
    }

    /// Reads up to `limit` violations of a kind, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the read fails or a record does not
    /// decode.
    pub async fn recent(&self, kind: ViolationKind, limit: usize) -> Result<Vec<Violation>> {
        let raw = self.backend.list_range(&violations_key(kind), limit).await?;

        raw.iter()
            .map(|bytes| {
                serde_json::from_slice(bytes).map_err(|e| {
                    AuthError::Store(StorageError::serialization_with_source(
                        "violation decode failed",
                        e,
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use walletgate_storage::MemoryBackend;

    use super::*;

    #[tokio::test]
    async fn test_report_and_read_back() {
        let reporter = ViolationReporter::new(Arc::new(MemoryBackend::new()));

        let mut details = BTreeMap::new();
        details.insert("wallet_address".into(), "wallet-a".into());
        let violation = Violation::builder()
            .kind(ViolationKind::InvalidSignature)
            .severity(Severity::High)
            .details(details)
            .build();

        reporter.report(&violation).await.unwrap();

        let recorded = reporter.recent(ViolationKind::InvalidSignature, 10).await.unwrap();
        assert_eq!(recorded, vec![violation]);
    }

    #[tokio::test]
    async fn test_kinds_are_grouped_separately() {
        let reporter = ViolationReporter::new(Arc::new(MemoryBackend::new()));

        let sig = Violation::builder()
            .kind(ViolationKind::InvalidSignature)
            .severity(Severity::High)
            .build();
        let rate = Violation::builder()
            .kind(ViolationKind::RateLimit)
            .severity(Severity::Medium)
            .build();

        reporter.report(&sig).await.unwrap();
        reporter.report(&rate).await.unwrap();

        assert_eq!(reporter.recent(ViolationKind::InvalidSignature, 10).await.unwrap().len(), 1);
        assert_eq!(reporter.recent(ViolationKind::RateLimit, 10).await.unwrap().len(), 1);
        assert!(reporter.recent(ViolationKind::Unauthorized, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_eviction() {
        let reporter = ViolationReporter::new(Arc::new(MemoryBackend::new()));

        for _ in 0..150 {
            let v = Violation::builder()
                .kind(ViolationKind::SuspiciousActivity)
                .severity(Severity::Low)
                .build();
            reporter.report(&v).await.unwrap();
        }

        let recorded =
            reporter.recent(ViolationKind::SuspiciousActivity, usize::MAX).await.unwrap();
        assert_eq!(recorded.len(), 150, "violations are not capped by this core");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_serde_wire_format() {
        let v = Violation::builder()
            .kind(ViolationKind::InvalidSignature)
            .severity(Severity::Critical)
            .build();
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.contains("\"INVALID_SIGNATURE\""), "{json}");
        assert!(json.contains("\"CRITICAL\""), "{json}");
    }
}
