// ## 📂 File: `src/engine/mod.rs`

//! engine/mod.rs
//! Envelope seal/open for buffered and streaming payloads.
//!
//! Design notes:
//! - The engine holds only its config; every call builds its own primitive
//!   from the caller's material and drops it on return.
//! - Header verification is an early-return guard: nothing reads, decrypts
//!   or allocates for the body until the header tag has been checked.
//! - Body AAD is the serialized encryption context, and only for
//!   algorithms that take AAD.

pub mod buffered;
pub mod streaming;

pub use streaming::StreamSummary;

use tracing::warn;

use crate::config::EngineConfig;
use crate::crypto::{AeadPrimitive, CryptoError};
use crate::envelope::{DecryptionMaterial, EncryptionMaterial};
use crate::headers::{check_header_tag, compute_header_tag, EnvelopeHeader, HeaderTagCheck};
use crate::types::EnvelopeError;

#[derive(Debug, Clone, Default)]
pub struct EnvelopeEngine {
    config: EngineConfig,
}

impl EnvelopeEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EnvelopeError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Untagged header from the material, then tag it with `primitive`.
    fn build_header(
        &self,
        material: &EncryptionMaterial,
        primitive: &dyn AeadPrimitive,
    ) -> Result<EnvelopeHeader, EnvelopeError> {
        if primitive.algorithm() != material.algorithm {
            return Err(CryptoError::AlgorithmMismatch {
                have: primitive.algorithm(),
                need: material.algorithm,
            }
            .into());
        }

        let limits = self.config.header_limits();
        if material.encrypted_data_keys.len() > limits.max_data_keys {
            return Err(EnvelopeError::Validation(format!(
                "{} encrypted data keys exceed max {}",
                material.encrypted_data_keys.len(),
                limits.max_data_keys
            )));
        }
        if material.encryption_context.len() > limits.max_context_entries {
            return Err(EnvelopeError::Validation(format!(
                "{} context entries exceed max {}",
                material.encryption_context.len(),
                limits.max_context_entries
            )));
        }
        let oversized = material
            .encrypted_data_keys
            .iter()
            .flat_map(|k| [k.key_id.len(), k.data_key.len()])
            .chain(material.encryption_context.iter().flat_map(|(k, v)| [k.len(), v.len()]))
            .any(|len| len > limits.max_field_len);
        if oversized {
            return Err(EnvelopeError::Validation(format!(
                "header field exceeds max length {}",
                limits.max_field_len
            )));
        }

        let mut header = EnvelopeHeader::new(
            material.version,
            material.algorithm,
            material.encrypted_data_keys.clone(),
            material.encryption_context.clone(),
        );
        compute_header_tag(&mut header, primitive)?;
        Ok(header)
    }
}

/// Fail closed unless the header tag recomputes under `primitive`.
pub(crate) fn authenticate_header(
    header: &EnvelopeHeader,
    primitive: &dyn AeadPrimitive,
) -> Result<(), EnvelopeError> {
    match check_header_tag(header, primitive) {
        HeaderTagCheck::Valid => Ok(()),
        HeaderTagCheck::Mismatch => {
            warn!(algorithm = %header.algorithm, "header tag mismatch");
            Err(EnvelopeError::HeaderIntegrity)
        }
        HeaderTagCheck::Fault(cause) => {
            warn!(algorithm = %header.algorithm, %cause, "header tag could not be recomputed");
            Err(EnvelopeError::HeaderIntegrity)
        }
    }
}

/// Every context entry the caller requires must be in the authenticated header.
pub(crate) fn check_required_context(
    header: &EnvelopeHeader,
    material: &DecryptionMaterial,
) -> Result<(), EnvelopeError> {
    match material.missing_context_entry(&header.encryption_context) {
        None => Ok(()),
        Some(key) => Err(EnvelopeError::Validation(format!(
            "required encryption context entry {key:?} missing or different"
        ))),
    }
}

pub(crate) fn body_aad(header: &EnvelopeHeader) -> Option<Vec<u8>> {
    header
        .algorithm
        .with_aad()
        .then(|| header.encryption_context.serialize())
}
