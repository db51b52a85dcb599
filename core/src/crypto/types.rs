// ## 📂 File: `src/crypto/types.rs`

use thiserror::Error;

use crate::utils::enum_name_or_hex;
use crate::crypto::algorithm::Algorithm;

/// Standard 12-byte IV length for GCM and ChaCha20-Poly1305.
pub const IV_LEN_12: usize = 12;

/// Block-sized IV used by CBC algorithms.
pub const IV_LEN_16: usize = 16;

/// Fixed AEAD tag length (bytes).
pub const TAG_LEN: usize = 16;

/// Cipher block size for AES and SM4.
pub const BLOCK_LEN: usize = 16;

/// Which way a primitive is bound: sealing or opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Seal,
    Open,
}

fn algorithm_label(raw: &u16) -> String {
    enum_name_or_hex::<Algorithm>(*raw)
}

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Unknown algorithm id on the wire or in a material.
    #[error("unsupported algorithm: {}", algorithm_label(.raw))]
    UnsupportedAlgorithm { raw: u16 },

    /// Primitive bound to one algorithm was asked to serve another.
    #[error("algorithm mismatch: primitive={have:?}, header={need:?}")]
    AlgorithmMismatch { have: Algorithm, need: Algorithm },

    /// Invalid key length provided to cipher.
    #[error("invalid key length: expected={expected}, actual={actual}")]
    InvalidKeyLen { expected: usize, actual: usize },

    /// IV length does not match the algorithm.
    #[error("invalid IV length: expected={expected}, actual={actual}")]
    InvalidIvLen { expected: usize, actual: usize },

    /// AEAD tag mismatch (authentication failure).
    #[error("AEAD tag mismatch")]
    TagMismatch,

    /// CBC padding was not valid PKCS#7 after decryption.
    #[error("invalid padding")]
    BadPadding,

    /// Input ended before a full tag or block was seen.
    #[error("truncated input: have={have}, need at least {need}")]
    Truncated { have: usize, need: usize },

    /// Streaming call made out of order (AAD after data, etc.).
    #[error("stream state error: {0}")]
    State(&'static str),

    /// General runtime error with context.
    #[error("crypto failure: {0}")]
    Failure(String),
}
