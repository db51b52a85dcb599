// ## 📂 File: `src/types.rs`

//! types.rs
//! Unified envelope error covering header integrity, malformed input,
//! body integrity, I/O, and the per-layer error types.
//!
//! Design notes:
//! - `From<T>` impls let `?` work across crypto, headers and framing.
//! - Integrity failures map onto dedicated variants so callers can tell a
//!   wrong key or forged header apart from a corrupted body.
//! - Only `Io` is worth retrying; everything else is a property of the input.

use std::io;
use thiserror::Error;

use crate::crypto::CryptoError;
use crate::headers::HeaderError;
use crate::stream::FrameError;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Header tag mismatch: wrong key, forged or corrupted header.
    /// Raised before any body byte is touched.
    #[error("header integrity check failed")]
    HeaderIntegrity,

    /// Input is not a well-formed envelope (tag length, truncated framing).
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// Body authentication failed (AEAD tag or CBC padding).
    #[error("body integrity check failed: {0}")]
    BodyIntegrity(#[source] CryptoError),

    /// Sink/source read, write or flush failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Primitive construction or usage error (key length, unsupported algorithm).
    #[error("crypto error: {0}")]
    Crypto(#[source] CryptoError),

    /// Header could not be encoded or decoded.
    #[error("header error: {0}")]
    Header(#[source] HeaderError),

    /// Caller-side misuse (bad config, inline/streamed mixups).
    #[error("validation error: {0}")]
    Validation(String),
}

impl EnvelopeError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, EnvelopeError::Io(_))
    }

    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, EnvelopeError::HeaderIntegrity | EnvelopeError::BodyIntegrity(_))
    }
}

impl From<CryptoError> for EnvelopeError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::TagMismatch | CryptoError::BadPadding => EnvelopeError::BodyIntegrity(e),
            CryptoError::Truncated { .. } => EnvelopeError::Malformed(e.to_string()),
            other => EnvelopeError::Crypto(other),
        }
    }
}

impl From<HeaderError> for EnvelopeError {
    fn from(e: HeaderError) -> Self {
        match e {
            HeaderError::Io(io) => EnvelopeError::Io(io),
            other => EnvelopeError::Header(other),
        }
    }
}

impl From<FrameError> for EnvelopeError {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Io(io) => EnvelopeError::Io(io),
            other => EnvelopeError::Malformed(other.to_string()),
        }
    }
}
