// ## 📂 File: `src/headers/decode.rs`
//! src/headers/decode.rs
//!
//! Header decoding.
//!
//! Design notes:
//! - One reader-based parser serves both slices (`decode_header`) and
//!   streams (`read_header`), so the two can never disagree.
//! - Every length prefix is checked against `HeaderLimits` before allocating.
//! - Decoding does not authenticate anything; `verify_header_tag` does.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Read};

use byteorder::{BigEndian, ByteOrder};

use crate::constants::{HEADER_TAG_LEN, MAGIC_AEH1};
use crate::crypto::Algorithm;
use crate::headers::context::EncryptionContext;
use crate::headers::types::{EncryptedDataKey, EnvelopeHeader, HeaderError, HeaderLimits};

struct FieldReader<'a, R: Read + ?Sized> {
    inner: &'a mut R,
    limits: &'a HeaderLimits,
    consumed: usize,
}

impl<'a, R: Read + ?Sized> FieldReader<'a, R> {
    fn fill(&mut self, buf: &mut [u8], field: &'static str) -> Result<(), HeaderError> {
        let mut off = 0;
        while off < buf.len() {
            match self.inner.read(&mut buf[off..]) {
                Ok(0) => {
                    return Err(HeaderError::BufferTooShort { field, have: off, need: buf.len() })
                }
                Ok(n) => off += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HeaderError::Io(e)),
            }
        }
        self.consumed += off;
        Ok(())
    }

    fn u16(&mut self, field: &'static str) -> Result<u16, HeaderError> {
        let mut b = [0u8; 2];
        self.fill(&mut b, field)?;
        Ok(BigEndian::read_u16(&b))
    }

    fn u32(&mut self, field: &'static str) -> Result<u32, HeaderError> {
        let mut b = [0u8; 4];
        self.fill(&mut b, field)?;
        Ok(BigEndian::read_u32(&b))
    }

    /// Length-prefixed field, bounded by `max_field_len`.
    fn bytes(&mut self, field: &'static str) -> Result<Vec<u8>, HeaderError> {
        let len = self.u32(field)? as usize;
        if len > self.limits.max_field_len {
            return Err(HeaderError::FieldTooLarge { field, len, max: self.limits.max_field_len });
        }
        let mut v = vec![0u8; len];
        self.fill(&mut v, field)?;
        Ok(v)
    }

    fn string(&mut self, field: &'static str) -> Result<String, HeaderError> {
        String::from_utf8(self.bytes(field)?).map_err(|_| HeaderError::InvalidUtf8 { field })
    }
}

/// Parse a header from the front of `buf`.
///
/// Returns the header and the number of bytes consumed; anything after
/// that belongs to the body.
pub fn decode_header(buf: &[u8], limits: &HeaderLimits) -> Result<(EnvelopeHeader, usize), HeaderError> {
    let mut cursor = buf;
    read_header(&mut cursor, limits)
}

/// Parse a header from a stream, consuming exactly the header bytes.
pub fn read_header<R: Read + ?Sized>(r: &mut R, limits: &HeaderLimits) -> Result<(EnvelopeHeader, usize), HeaderError> {
    let mut fr = FieldReader { inner: r, limits, consumed: 0 };

    let mut magic = [0u8; 4];
    fr.fill(&mut magic, "magic")?;
    if magic != MAGIC_AEH1 {
        return Err(HeaderError::InvalidMagic { have: magic, need: MAGIC_AEH1 });
    }

    let version = fr.u32("version")?;
    let raw_alg = fr.u16("algorithm")?;
    let algorithm = Algorithm::from_id(raw_alg).map_err(|_| HeaderError::UnknownAlgorithm { raw: raw_alg })?;

    let key_count = fr.u32("data key count")? as usize;
    if key_count > limits.max_data_keys {
        return Err(HeaderError::TooManyDataKeys { count: key_count, max: limits.max_data_keys });
    }
    let mut encrypted_data_keys = Vec::with_capacity(key_count);
    for _ in 0..key_count {
        let key_id = fr.string("key id")?;
        let data_key = fr.bytes("encrypted data key")?;
        encrypted_data_keys.push(EncryptedDataKey { key_id, data_key });
    }

    let entry_count = fr.u32("context entry count")? as usize;
    if entry_count > limits.max_context_entries {
        return Err(HeaderError::TooManyContextEntries { count: entry_count, max: limits.max_context_entries });
    }
    let mut entries = BTreeMap::new();
    let mut last: Option<String> = None;
    for _ in 0..entry_count {
        let key = fr.string("context key")?;
        let value = fr.string("context value")?;
        // Canonical form: strictly ascending keys.
        if last.as_deref().is_some_and(|prev| prev >= key.as_str()) {
            return Err(HeaderError::NonCanonicalContext { key });
        }
        last = Some(key.clone());
        entries.insert(key, value);
    }

    let header_iv = fr.bytes("header iv")?;
    if header_iv.len() != algorithm.iv_len() {
        return Err(HeaderError::InvalidIvLen { have: header_iv.len(), need: algorithm.iv_len() });
    }
    let header_auth_tag = fr.bytes("header tag")?;
    if header_auth_tag.len() != HEADER_TAG_LEN {
        return Err(HeaderError::InvalidTagLen { have: header_auth_tag.len(), need: HEADER_TAG_LEN });
    }

    let consumed = fr.consumed;
    let header = EnvelopeHeader {
        version,
        algorithm,
        encrypted_data_keys,
        encryption_context: EncryptionContext::from(entries),
        header_iv,
        header_auth_tag,
    };
    Ok((header, consumed))
}
