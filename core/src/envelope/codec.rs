// ## 📂 File: `src/envelope/codec.rs`
//! src/envelope/codec.rs
//!
//! Whole-envelope serialization for buffered mode.
//!
//! Layout: `header wire ‖ u32 ivLen ‖ iv ‖ u32 ctLen ‖ ct ‖ u32 tagLen ‖ tag`,
//! all big-endian. Streaming envelopes have no in-memory body and cannot
//! be serialized this way.

use byteorder::{BigEndian, ByteOrder};

use crate::constants::LEN_PREFIX;
use crate::envelope::types::{BodyPayload, Envelope, EnvelopeBody};
use crate::headers::{decode_header, encode_header, HeaderLimits};
use crate::stream::{read_iv, FrameError};
use crate::types::EnvelopeError;

impl Envelope {
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        let (ciphertext, auth_tag) = match &self.body.payload {
            BodyPayload::Inline { ciphertext, auth_tag } => (ciphertext, auth_tag),
            BodyPayload::Streamed => {
                return Err(EnvelopeError::Validation(
                    "streamed envelope body lives in the output sink".into(),
                ))
            }
        };

        let header = encode_header(&self.header)?;
        let mut out = Vec::with_capacity(
            header.len() + 3 * LEN_PREFIX + self.body.iv.len() + ciphertext.len() + auth_tag.len(),
        );
        out.extend_from_slice(&header);
        for field in [&self.body.iv, ciphertext, auth_tag] {
            out.extend_from_slice(&(field.len() as u32).to_be_bytes());
            out.extend_from_slice(field);
        }
        Ok(out)
    }

    /// Parse a buffered envelope. Nothing is authenticated here.
    pub fn from_bytes(buf: &[u8], limits: &HeaderLimits) -> Result<Self, EnvelopeError> {
        let (header, used) = decode_header(buf, limits)?;
        let mut rest = &buf[used..];

        let iv = read_iv(&mut rest, header.algorithm.iv_len())?;
        let ciphertext = take_field(&mut rest, "ciphertext")?;
        let auth_tag = take_field(&mut rest, "auth tag")?;
        if !rest.is_empty() {
            return Err(FrameError::TrailingBytes { extra: rest.len() }.into());
        }

        Ok(Envelope::new(header, EnvelopeBody::inline(iv, ciphertext, auth_tag)))
    }
}

/// u32-prefixed field whose length is bounded by what is left in `rest`.
fn take_field(rest: &mut &[u8], field: &'static str) -> Result<Vec<u8>, FrameError> {
    if rest.len() < LEN_PREFIX {
        return Err(FrameError::Truncated { field, have: rest.len(), need: LEN_PREFIX });
    }
    let len = BigEndian::read_u32(&rest[..LEN_PREFIX]) as usize;
    let body = &rest[LEN_PREFIX..];
    if body.len() < len {
        return Err(FrameError::Truncated { field, have: body.len(), need: len });
    }
    let value = body[..len].to_vec();
    *rest = &body[len..];
    Ok(value)
}
