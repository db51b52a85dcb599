//! envelope/material.rs
//! Per-call key material handed in by the key provider.
//!
//! The plaintext data key lives in `Zeroizing` storage and is wiped when
//! the material is dropped. `Debug` never prints it.

use std::fmt;
use zeroize::Zeroizing;

use crate::constants::FORMAT_VERSION_V1;
use crate::crypto::Algorithm;
use crate::headers::{EncryptedDataKey, EncryptionContext};

/// Everything needed to seal one message.
pub struct EncryptionMaterial {
    pub version: u32,
    pub algorithm: Algorithm,
    pub plaintext_data_key: Zeroizing<Vec<u8>>,
    pub encrypted_data_keys: Vec<EncryptedDataKey>,
    pub encryption_context: EncryptionContext,
}

impl EncryptionMaterial {
    /// v1 material; the key is copied into zeroizing storage.
    pub fn new(
        algorithm: Algorithm,
        plaintext_data_key: &[u8],
        encrypted_data_keys: Vec<EncryptedDataKey>,
        encryption_context: EncryptionContext,
    ) -> Self {
        Self {
            version: FORMAT_VERSION_V1,
            algorithm,
            plaintext_data_key: Zeroizing::new(plaintext_data_key.to_vec()),
            encrypted_data_keys,
            encryption_context,
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }
}

impl fmt::Debug for EncryptionMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionMaterial")
            .field("version", &self.version)
            .field("algorithm", &self.algorithm)
            .field("plaintext_data_key", &"<redacted>")
            .field("encrypted_data_keys", &self.encrypted_data_keys)
            .field("encryption_context", &self.encryption_context)
            .finish()
    }
}

/// Recovered data key for opening one message.
///
/// `encryption_context` lists entries the caller requires; each must be
/// present with the same value in the (authenticated) header context.
pub struct DecryptionMaterial {
    pub algorithm: Algorithm,
    pub plaintext_data_key: Zeroizing<Vec<u8>>,
    pub encryption_context: EncryptionContext,
}

impl DecryptionMaterial {
    pub fn new(algorithm: Algorithm, plaintext_data_key: &[u8]) -> Self {
        Self {
            algorithm,
            plaintext_data_key: Zeroizing::new(plaintext_data_key.to_vec()),
            encryption_context: EncryptionContext::new(),
        }
    }

    pub fn with_required_context(mut self, encryption_context: EncryptionContext) -> Self {
        self.encryption_context = encryption_context;
        self
    }

    /// First required entry missing from (or different in) `actual`.
    pub fn missing_context_entry<'a>(&'a self, actual: &EncryptionContext) -> Option<&'a str> {
        self.encryption_context
            .iter()
            .find(|(k, v)| actual.get(k) != Some(*v))
            .map(|(k, _)| k)
    }
}

impl fmt::Debug for DecryptionMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionMaterial")
            .field("algorithm", &self.algorithm)
            .field("plaintext_data_key", &"<redacted>")
            .field("encryption_context", &self.encryption_context)
            .finish()
    }
}
