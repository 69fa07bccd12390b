//! Detached Ed25519 signature verification.
//!
//! Wallet addresses are base58-encoded Ed25519 public keys. Authentication
//! proof is a detached signature over the exact message bytes — no hashing
//! pre-step, no canonicalization beyond byte equality between the signed
//! message and the message supplied by the caller.
//!
//! Verification is a pure function with no side effects and no I/O. A
//! malformed *signature* verifies as `false`; a malformed *public key* is a
//! distinct [`AuthError::MalformedIdentity`] so the pipeline can
//! short-circuit before attempting cryptographic work and record a clearer
//! audit reason.

use ed25519_dalek::{PUBLIC_KEY_LENGTH, Signature, Verifier, VerifyingKey};

use crate::error::AuthError;

/// Decodes a base58 wallet address into an Ed25519 verifying key.
///
/// # Errors
///
/// Returns [`AuthError::MalformedIdentity`] if the address is not valid
/// base58, does not decode to exactly 32 bytes, or is not a valid curve
/// point.
pub fn decode_wallet_address(wallet_address: &str) -> Result<VerifyingKey, AuthError> {
    let bytes = bs58::decode(wallet_address).into_vec().map_err(|e| {
        AuthError::malformed_identity(format!("wallet address is not valid base58: {e}"))
    })?;

    let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
        AuthError::malformed_identity(format!(
            "wallet address decodes to {} bytes, expected {PUBLIC_KEY_LENGTH}",
            bytes.len()
        ))
    })?;

    VerifyingKey::from_bytes(&bytes).map_err(|e| {
        AuthError::malformed_identity(format!("not a valid Ed25519 public key: {e}"))
    })
}

/// Verifies a detached Ed25519 signature over the exact message bytes.
///
/// Returns `Ok(true)` when `signature` was produced by the key behind
/// `wallet_address` signing exactly `message`; `Ok(false)` when the
/// signature does not verify or is structurally malformed (wrong length).
///
/// # Errors
///
/// Returns [`AuthError::MalformedIdentity`] when the wallet address itself
/// cannot be decoded — verification is not attempted in that case.
pub fn verify_detached(
    wallet_address: &str,
    message: &[u8],
    signature: &[u8],
) -> Result<bool, AuthError> {
    let key = decode_wallet_address(wallet_address)?;

    let Ok(signature) = Signature::from_slice(signature) else {
        return Ok(false);
    };

    Ok(key.verify(message, &signature).is_ok())
}
