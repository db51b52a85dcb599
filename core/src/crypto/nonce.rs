// ## 📂 File: `src/crypto/nonce.rs`

//! crypto/nonce.rs
//! Fresh random IVs for header tags and message bodies.
//!
//! Every IV is an independent draw from the OS CSPRNG. Nothing is cached
//! between calls, so concurrent callers never share generator state.
//!
//! Uniqueness is statistical: with 96-bit IVs a collision under one key
//! becomes plausible only after ~2^48 messages.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::crypto::types::CryptoError;

/// Draw `len` bytes from the OS CSPRNG.
#[inline]
pub fn random_iv(len: usize) -> Result<Vec<u8>, CryptoError> {
    let mut iv = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| CryptoError::Failure(format!("secure random source failed: {e}")))?;
    Ok(iv)
}
