// ## 📂 File: `src/headers/types.rs`

//! headers/types.rs
//! Header struct, encrypted data key blob, decoder limits and errors.

use std::fmt;

use crate::constants::{
    DEFAULT_MAX_CONTEXT_ENTRIES, DEFAULT_MAX_DATA_KEYS, DEFAULT_MAX_FIELD_LEN, FORMAT_VERSION_V1,
};
use crate::crypto::{Algorithm, CryptoError};
use crate::headers::context::EncryptionContext;
use crate::utils::{enum_name_or_hex, fmt_bytes};

/// Data key wrapped by one master key. Produced and consumed by the key
/// provider; the engine only carries it and binds it into the header tag.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedDataKey {
    pub key_id: String,
    pub data_key: Vec<u8>,
}

impl EncryptedDataKey {
    pub fn new(key_id: impl Into<String>, data_key: impl Into<Vec<u8>>) -> Self {
        Self { key_id: key_id.into(), data_key: data_key.into() }
    }
}

impl fmt::Debug for EncryptedDataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedDataKey")
            .field("key_id", &self.key_id)
            .field("data_key_len", &self.data_key.len())
            .finish()
    }
}

/// Authenticated envelope header.
///
/// `header_iv` / `header_auth_tag` are empty until `compute_header_tag` runs,
/// and are set exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeHeader {
    pub version: u32,
    pub algorithm: Algorithm,
    pub encrypted_data_keys: Vec<EncryptedDataKey>,
    pub encryption_context: EncryptionContext,
    pub header_iv: Vec<u8>,
    pub header_auth_tag: Vec<u8>,
}

impl EnvelopeHeader {
    /// Fresh, untagged header.
    pub fn new(
        version: u32,
        algorithm: Algorithm,
        encrypted_data_keys: Vec<EncryptedDataKey>,
        encryption_context: EncryptionContext,
    ) -> Self {
        Self {
            version,
            algorithm,
            encrypted_data_keys,
            encryption_context,
            header_iv: Vec::new(),
            header_auth_tag: Vec::new(),
        }
    }

    /// Untagged v1 header with no data keys and an empty context.
    pub fn v1(algorithm: Algorithm) -> Self {
        Self::new(FORMAT_VERSION_V1, algorithm, Vec::new(), EncryptionContext::new())
    }

    pub fn is_tagged(&self) -> bool {
        !self.header_auth_tag.is_empty()
    }
}

/// Decoder sanity bounds. Length fields above these are rejected before
/// any allocation happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLimits {
    pub max_field_len: usize,
    pub max_data_keys: usize,
    pub max_context_entries: usize,
}

impl Default for HeaderLimits {
    fn default() -> Self {
        Self {
            max_field_len: DEFAULT_MAX_FIELD_LEN,
            max_data_keys: DEFAULT_MAX_DATA_KEYS,
            max_context_entries: DEFAULT_MAX_CONTEXT_ENTRIES,
        }
    }
}

/// Outcome of recomputing the header tag.
///
/// `Fault` carries the cause for diagnostics only; callers must treat it
/// exactly like `Mismatch`.
#[derive(Debug)]
pub enum HeaderTagCheck {
    Valid,
    Mismatch,
    Fault(CryptoError),
}

impl HeaderTagCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, HeaderTagCheck::Valid)
    }
}

#[derive(Debug)]
pub enum HeaderError {
    /// Buffer ended before the field being read.
    BufferTooShort { field: &'static str, have: usize, need: usize },

    /// Invalid magic marker (expected "AEH1").
    InvalidMagic { have: [u8; 4], need: [u8; 4] },

    /// Algorithm id not in the registry.
    UnknownAlgorithm { raw: u16 },

    /// Length prefix above the configured bound.
    FieldTooLarge { field: &'static str, len: usize, max: usize },

    /// More encrypted data keys than allowed.
    TooManyDataKeys { count: usize, max: usize },

    /// More context entries than allowed.
    TooManyContextEntries { count: usize, max: usize },

    /// Context key or value, or a key id, is not UTF-8.
    InvalidUtf8 { field: &'static str },

    /// Context keys must be unique and sorted on the wire.
    NonCanonicalContext { key: String },

    /// Header tag length is not the fixed header tag length.
    InvalidTagLen { have: usize, need: usize },

    /// Header IV length does not match the algorithm.
    InvalidIvLen { have: usize, need: usize },

    /// Encoding a header that has not been tagged yet.
    Untagged,

    /// Underlying reader failed (not truncation).
    Io(std::io::Error),
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use HeaderError::*;
        match self {
            BufferTooShort { field, have, need } =>
                write!(f, "header truncated at {}: {} < {}", field, have, need),
            InvalidMagic { have, need } =>
                write!(f, "invalid magic: expected {}, got {}", fmt_bytes(need, 4), fmt_bytes(have, 4)),
            UnknownAlgorithm { raw } =>
                write!(f, "unknown algorithm: {}", enum_name_or_hex::<Algorithm>(*raw)),
            FieldTooLarge { field, len, max } =>
                write!(f, "{} length {} exceeds {}", field, len, max),
            TooManyDataKeys { count, max } =>
                write!(f, "too many encrypted data keys: {} > {}", count, max),
            TooManyContextEntries { count, max } =>
                write!(f, "too many context entries: {} > {}", count, max),
            InvalidUtf8 { field } =>
                write!(f, "{} is not valid UTF-8", field),
            NonCanonicalContext { key } =>
                write!(f, "encryption context not in canonical order at key {:?}", key),
            InvalidTagLen { have, need } =>
                write!(f, "invalid header tag length: {} != {}", have, need),
            InvalidIvLen { have, need } =>
                write!(f, "invalid header IV length: {} != {}", have, need),
            Untagged =>
                write!(f, "header has no tag; compute it before encoding"),
            Io(e) =>
                write!(f, "header read failed: {}", e),
        }
    }
}

impl std::error::Error for HeaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HeaderError::Io(e) => Some(e),
            _ => None,
        }
    }
}

