//! Shared storage abstraction for the Walletgate gateway core.
//!
//! This crate provides the [`StorageBackend`] trait and related types that
//! back every stateful component of the gateway — rate-limit counters,
//! security contexts, audit and violation logs — plus the [`UserDirectory`]
//! collaborator boundary for identity resolution.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   walletgate-gateway                        │
//! │  RateLimiter │ SecurityContextStore │ AuditLog │ BanList    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   walletgate-storage                        │
//! │                  StorageBackend trait                       │
//! │   (get/set with TTL, incr_with_window, list_push/range)     │
//! ├──────────────┬──────────────────────────────────────────────┤
//! │ MemoryBackend│        production KV store adapter           │
//! │   (testing)  │         (out of tree)                        │
//! └──────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use walletgate_storage::{MemoryBackend, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MemoryBackend::new();
//!
//!     // Plain key-value with TTL
//!     backend
//!         .set_with_ttl(b"session:1".to_vec(), b"{}".to_vec(), std::time::Duration::from_secs(60))
//!         .await?;
//!
//!     // Atomic fixed-window counter
//!     let count = backend
//!         .incr_with_window(b"rate:connect:1.2.3.4", std::time::Duration::from_secs(60))
//!         .await?;
//!     assert_eq!(count, 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`StorageResult<T>`], which wraps potential
//! [`StorageError`] variants. Backends should map their internal errors to
//! these standardized error types.

#![deny(unsafe_code)]

pub mod backend;
pub mod directory;
pub mod error;
pub mod memory;
pub mod timeout;

// Re-export primary types at crate root for convenience
pub use backend::StorageBackend;
pub use directory::{MemoryUserDirectory, UserDirectory, UserRecord};
pub use error::{BoxError, StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use timeout::{DEFAULT_OP_TIMEOUT, TimeoutBackend};
