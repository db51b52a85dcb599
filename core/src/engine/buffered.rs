//! engine/buffered.rs
//! Whole-buffer seal and open.

use tracing::{debug, warn};

use crate::crypto::{random_iv, AeadPrimitive, AlgorithmHandler, CryptoError};
use crate::engine::{authenticate_header, body_aad, check_required_context, EnvelopeEngine};
use crate::envelope::{BodyPayload, DecryptionMaterial, EncryptionMaterial, Envelope, EnvelopeBody};
use crate::types::EnvelopeError;

impl EnvelopeEngine {
    /// Seal `plaintext` into a fresh envelope.
    pub fn encrypt(&self, plaintext: &[u8], material: &EncryptionMaterial) -> Result<Envelope, EnvelopeError> {
        let primitive = AlgorithmHandler::new(material.algorithm, &material.plaintext_data_key)?;
        self.encrypt_with(&primitive, plaintext, material)
    }

    pub fn encrypt_with(
        &self,
        primitive: &dyn AeadPrimitive,
        plaintext: &[u8],
        material: &EncryptionMaterial,
    ) -> Result<Envelope, EnvelopeError> {
        let header = self.build_header(material, primitive)?;
        let algorithm = header.algorithm;

        // Independent draw from the header IV.
        let iv = random_iv(algorithm.iv_len())?;
        let aad = body_aad(&header);
        let mut ciphertext = primitive.seal(&iv, aad.as_deref(), plaintext)?;

        let tag_len = algorithm.tag_len();
        if ciphertext.len() < tag_len {
            return Err(CryptoError::Failure(format!(
                "sealed output shorter than tag: {} < {}",
                ciphertext.len(),
                tag_len
            ))
            .into());
        }
        let auth_tag = ciphertext.split_off(ciphertext.len() - tag_len);

        debug!(
            %algorithm,
            plaintext_len = plaintext.len(),
            ciphertext_len = ciphertext.len(),
            data_keys = header.encrypted_data_keys.len(),
            "sealed buffered envelope"
        );
        Ok(Envelope::new(header, EnvelopeBody::inline(iv, ciphertext, auth_tag)))
    }

    /// Open a buffered envelope. The header is verified before the body is looked at.
    pub fn decrypt(&self, envelope: &Envelope, material: &DecryptionMaterial) -> Result<Vec<u8>, EnvelopeError> {
        let primitive = AlgorithmHandler::new(material.algorithm, &material.plaintext_data_key)?;
        self.decrypt_with(&primitive, envelope, material)
    }

    pub fn decrypt_with(
        &self,
        primitive: &dyn AeadPrimitive,
        envelope: &Envelope,
        material: &DecryptionMaterial,
    ) -> Result<Vec<u8>, EnvelopeError> {
        let header = &envelope.header;
        authenticate_header(header, primitive)?;
        check_required_context(header, material)?;

        let algorithm = header.algorithm;
        let (ciphertext, auth_tag) = match &envelope.body.payload {
            BodyPayload::Inline { ciphertext, auth_tag } => (ciphertext, auth_tag),
            BodyPayload::Streamed => {
                return Err(EnvelopeError::Validation(
                    "streamed envelope must be opened with decrypt_stream".into(),
                ))
            }
        };
        if envelope.body.iv.len() != algorithm.iv_len() {
            return Err(EnvelopeError::Malformed(format!(
                "body IV length {} != {}",
                envelope.body.iv.len(),
                algorithm.iv_len()
            )));
        }
        if auth_tag.len() != algorithm.tag_len() {
            return Err(EnvelopeError::Malformed(format!(
                "auth tag length {} != {}",
                auth_tag.len(),
                algorithm.tag_len()
            )));
        }

        let aad = body_aad(header);
        let opened = if auth_tag.is_empty() {
            primitive.open(&envelope.body.iv, aad.as_deref(), ciphertext)
        } else {
            let mut raw = Vec::with_capacity(ciphertext.len() + auth_tag.len());
            raw.extend_from_slice(ciphertext);
            raw.extend_from_slice(auth_tag);
            primitive.open(&envelope.body.iv, aad.as_deref(), &raw)
        };

        match opened {
            Ok(plaintext) => {
                debug!(%algorithm, plaintext_len = plaintext.len(), "opened buffered envelope");
                Ok(plaintext)
            }
            Err(e) => {
                let err = EnvelopeError::from(e);
                if err.is_integrity_failure() {
                    warn!(%algorithm, "body authentication failed");
                }
                Err(err)
            }
        }
    }
}
