// ## 📂 File: `src/envelope/types.rs`

//! envelope/types.rs
//! Header + body, the unit exchanged with storage or transport.
//!
//! Design notes:
//! - An `Envelope` is built once per seal and never mutated afterwards.
//! - Streaming seal leaves ciphertext and tag in the sink; the body says so
//!   explicitly with `BodyPayload::Streamed` instead of empty vectors.

use crate::headers::EnvelopeHeader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyPayload {
    /// Buffered mode: ciphertext and tag held in memory.
    /// `auth_tag` is empty for algorithms without a tag.
    Inline { ciphertext: Vec<u8>, auth_tag: Vec<u8> },
    /// Streaming mode: ciphertext and tag were written to the output sink.
    Streamed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeBody {
    pub iv: Vec<u8>,
    pub payload: BodyPayload,
}

impl EnvelopeBody {
    pub fn inline(iv: Vec<u8>, ciphertext: Vec<u8>, auth_tag: Vec<u8>) -> Self {
        Self { iv, payload: BodyPayload::Inline { ciphertext, auth_tag } }
    }

    pub fn streamed(iv: Vec<u8>) -> Self {
        Self { iv, payload: BodyPayload::Streamed }
    }

    pub fn is_streamed(&self) -> bool {
        matches!(self.payload, BodyPayload::Streamed)
    }

    pub fn ciphertext(&self) -> Option<&[u8]> {
        match &self.payload {
            BodyPayload::Inline { ciphertext, .. } => Some(ciphertext),
            BodyPayload::Streamed => None,
        }
    }

    pub fn auth_tag(&self) -> Option<&[u8]> {
        match &self.payload {
            BodyPayload::Inline { auth_tag, .. } => Some(auth_tag),
            BodyPayload::Streamed => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub header: EnvelopeHeader,
    pub body: EnvelopeBody,
}

impl Envelope {
    pub fn new(header: EnvelopeHeader, body: EnvelopeBody) -> Self {
        Self { header, body }
    }
}
