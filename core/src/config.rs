// ## 📂 File: `src/config.rs`

//! config.rs
//! Engine configuration: chunk size and decoder sanity bounds.
//!
//! Loaded from JSON (serde) or built from `Default`. Missing JSON fields
//! fall back to their defaults.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CONTEXT_ENTRIES, DEFAULT_MAX_DATA_KEYS, DEFAULT_MAX_FIELD_LEN,
    MAX_CHUNK_SIZE,
};
use crate::headers::HeaderLimits;
use crate::types::EnvelopeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Plaintext (seal) or ciphertext (open) bytes read per streaming chunk.
    pub chunk_size: usize,
    /// Upper bound for any single length-prefixed header field.
    pub max_field_len: usize,
    /// Upper bound for the number of encrypted data keys in a header.
    pub max_data_keys: usize,
    /// Upper bound for the number of encryption context entries.
    pub max_context_entries: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_field_len: DEFAULT_MAX_FIELD_LEN,
            max_data_keys: DEFAULT_MAX_DATA_KEYS,
            max_context_entries: DEFAULT_MAX_CONTEXT_ENTRIES,
        }
    }
}

impl EngineConfig {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.chunk_size == 0 {
            return Err(EnvelopeError::Validation("chunk_size must be non-zero".into()));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(EnvelopeError::Validation(format!(
                "chunk_size {} exceeds max {}",
                self.chunk_size, MAX_CHUNK_SIZE
            )));
        }
        if self.max_field_len == 0 || self.max_field_len > u32::MAX as usize {
            return Err(EnvelopeError::Validation(format!(
                "max_field_len {} out of range",
                self.max_field_len
            )));
        }
        if self.max_data_keys == 0 {
            return Err(EnvelopeError::Validation("max_data_keys must be non-zero".into()));
        }
        Ok(())
    }

    pub fn header_limits(&self) -> HeaderLimits {
        HeaderLimits {
            max_field_len: self.max_field_len,
            max_data_keys: self.max_data_keys,
            max_context_entries: self.max_context_entries,
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self, EnvelopeError> {
        let cfg: EngineConfig = serde_json::from_str(s)
            .map_err(|e| EnvelopeError::Validation(format!("invalid config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json_string(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EnvelopeError::Validation(format!("config serialization failed: {e}")))
    }
}
