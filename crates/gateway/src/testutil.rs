//! Shared test utilities for gateway testing.
//!
//! Provides Ed25519 test wallets and bearer-credential builders, plus an
//! assertion macro for [`AuthError`](crate::AuthError) variants. Feature-
//! gated behind `testutil` to prevent leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! walletgate-gateway = { path = "../gateway", features = ["testutil"] }
//! ```

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use ed25519_dalek::{Signer, SigningKey};
use rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

/// A freshly generated Ed25519 wallet for tests.
///
/// The private half lives only inside the [`SigningKey`], which scrubs its
/// material on drop.
pub struct TestWallet {
    signing_key: SigningKey,
    /// The base58 wallet address (the public key).
    pub address: String,
}

impl TestWallet {
    /// Generates a wallet with a fresh random key pair.
    ///
    /// The intermediate seed is wrapped in [`Zeroizing`] so it is scrubbed
    /// from memory on drop, even in test code.
    #[must_use]
    pub fn generate() -> Self {
        let mut seed = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut *seed);
        let signing_key = SigningKey::from_bytes(&seed);
        let address = bs58::encode(signing_key.verifying_key().to_bytes()).into_string();
        Self { signing_key, address }
    }

    /// Signs a message, returning the raw 64-byte detached signature.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    /// Signs a message, returning the signature as standard base64.
    #[must_use]
    pub fn sign_b64(&self, message: &str) -> String {
        BASE64_STANDARD.encode(self.sign(message.as_bytes()))
    }

    /// Builds a full `Authorization` header value for a message this wallet
    /// signed.
    #[must_use]
    pub fn bearer(&self, message: &str) -> String {
        format!("Bearer {}.{}.{}", self.address, self.sign_b64(message), message)
    }

    /// Builds an `Authorization` header with an arbitrary signature segment.
    #[must_use]
    pub fn bearer_with_signature(&self, signature_b64: &str, message: &str) -> String {
        format!("Bearer {}.{signature_b64}.{message}", self.address)
    }

    /// Builds an `Authorization` header whose signature has one flipped
    /// bit, so it is structurally valid but never verifies.
    #[must_use]
    pub fn tampered_bearer(&self, message: &str) -> String {
        let mut signature = self.sign(message.as_bytes());
        signature[0] ^= 0x01;
        self.bearer_with_signature(&BASE64_STANDARD.encode(signature), message)
    }
}

/// Asserts that a `Result<T, AuthError>` is an `Err` matching the given
/// [`AuthError`](crate::error::AuthError) variant.
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use walletgate_gateway::assert_gateway_error;
/// use walletgate_gateway::error::AuthError;
///
/// let result: Result<(), AuthError> = Err(AuthError::invalid_signature());
/// assert_gateway_error!(result, InvalidSignature);
/// ```
#[macro_export]
macro_rules! assert_gateway_error {
    ($result:expr, $variant:ident) => {
        assert!(
            matches!($result, Err($crate::error::AuthError::$variant { .. })),
            "expected AuthError::{}, got: {:?}",
            stringify!($variant),
            $result,
        );
    };
    ($result:expr, $variant:ident, $msg:expr) => {
        assert!(
            matches!($result, Err($crate::error::AuthError::$variant { .. })),
            "{}: expected AuthError::{}, got: {:?}",
            $msg,
            stringify!($variant),
            $result,
        );
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::signature::verify_detached;

    #[test]
    fn test_generated_wallets_are_unique() {
        let a = TestWallet::generate();
        let b = TestWallet::generate();
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn test_address_is_32_byte_base58() {
        let wallet = TestWallet::generate();
        let decoded = bs58::decode(&wallet.address).into_vec().unwrap();
        assert_eq!(decoded.len(), 32);
    }

    #[test]
    fn test_bearer_credential_verifies() {
        let wallet = TestWallet::generate();
        let header = wallet.bearer("hello");

        let token = header.strip_prefix("Bearer ").unwrap();
        let (address, rest) = token.split_once('.').unwrap();
        let (sig_b64, message) = rest.split_once('.').unwrap();

        let signature = BASE64_STANDARD.decode(sig_b64).unwrap();
        assert!(verify_detached(address, message.as_bytes(), &signature).unwrap());
    }

    #[test]
    fn test_tampered_bearer_does_not_verify() {
        let wallet = TestWallet::generate();
        let header = wallet.tampered_bearer("hello");

        let token = header.strip_prefix("Bearer ").unwrap();
        let (address, rest) = token.split_once('.').unwrap();
        let (sig_b64, message) = rest.split_once('.').unwrap();

        let signature = BASE64_STANDARD.decode(sig_b64).unwrap();
        assert!(!verify_detached(address, message.as_bytes(), &signature).unwrap());
    }

    #[test]
    fn test_assert_gateway_error_macro() {
        use crate::error::AuthError;

        let result: Result<(), AuthError> = Err(AuthError::invalid_signature());
        assert_gateway_error!(result, InvalidSignature);

        let result: Result<(), AuthError> = Err(AuthError::rate_limited());
        assert_gateway_error!(result, RateLimited, "limiter should reject");
    }
}
