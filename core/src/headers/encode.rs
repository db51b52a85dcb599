// ## 📂 File: `src/headers/encode.rs`
//! src/headers/encode.rs
//!
//! Header encoding.
//!
//! Design notes:
//! - `serialize_authenticated_fields` is the exact AAD fed to the header tag;
//!   any change here changes every tag.
//! - Wire layout:
//!   `magic ‖ u32 version ‖ u16 alg ‖ u32 n ‖ (key_id, data_key)*n ‖ context ‖ u32 ivLen ‖ iv ‖ u32 tagLen ‖ tag`.

use crate::constants::MAGIC_AEH1;
use crate::headers::types::{EnvelopeHeader, HeaderError};

#[inline]
pub(crate) fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

#[inline]
pub(crate) fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

/// u32 length prefix then the raw bytes.
#[inline]
pub(crate) fn put_field(out: &mut Vec<u8>, b: &[u8]) {
    put_u32(out, b.len() as u32);
    out.extend_from_slice(b);
}

/// Deterministic serialization of {version, algorithm, data keys, context}.
pub fn serialize_authenticated_fields(h: &EnvelopeHeader) -> Vec<u8> {
    let mut out = Vec::with_capacity(authenticated_len(h));
    write_authenticated_fields(&mut out, h);
    out
}

fn write_authenticated_fields(out: &mut Vec<u8>, h: &EnvelopeHeader) {
    put_u32(out, h.version);
    put_u16(out, h.algorithm.id());
    put_u32(out, h.encrypted_data_keys.len() as u32);
    for edk in &h.encrypted_data_keys {
        put_field(out, edk.key_id.as_bytes());
        put_field(out, &edk.data_key);
    }
    h.encryption_context.write_to(out);
}

fn authenticated_len(h: &EnvelopeHeader) -> usize {
    4 + 2 + 4
        + h.encrypted_data_keys
            .iter()
            .map(|k| 8 + k.key_id.len() + k.data_key.len())
            .sum::<usize>()
        + h.encryption_context.serialized_len()
}

/// Serialize a tagged header for storage or transport.
///
/// Fails with `HeaderError::Untagged` if the header tag was never computed.
pub fn encode_header(h: &EnvelopeHeader) -> Result<Vec<u8>, HeaderError> {
    if !h.is_tagged() {
        return Err(HeaderError::Untagged);
    }
    let mut out = Vec::with_capacity(encoded_len(h));
    out.extend_from_slice(&MAGIC_AEH1);
    write_authenticated_fields(&mut out, h);
    put_field(&mut out, &h.header_iv);
    put_field(&mut out, &h.header_auth_tag);

    debug_assert_eq!(out.len(), encoded_len(h), "header encoding wrote incorrect length");
    Ok(out)
}

/// Exact length of `encode_header(h)`.
pub fn encoded_len(h: &EnvelopeHeader) -> usize {
    MAGIC_AEH1.len() + authenticated_len(h) + 8 + h.header_iv.len() + h.header_auth_tag.len()
}
