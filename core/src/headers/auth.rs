//! headers/auth.rs
//! Header tag compute / verify.
//!
//! The tag is `tag_only(key, header_iv, AAD = serialize_authenticated_fields)`.
//! Verification recomputes it with the stored IV and compares in constant
//! time. Any fault while recomputing counts as a mismatch.

use subtle::ConstantTimeEq;
use tracing::debug;

use crate::constants::HEADER_TAG_LEN;
use crate::crypto::{random_iv, AeadPrimitive, CryptoError};
use crate::headers::encode::serialize_authenticated_fields;
use crate::headers::types::{EnvelopeHeader, HeaderTagCheck};

/// Draw a fresh header IV, compute the tag and store both on `header`.
///
/// Tagging is one-shot: a header that already carries a tag is rejected.
pub fn compute_header_tag(header: &mut EnvelopeHeader, primitive: &dyn AeadPrimitive) -> Result<(), CryptoError> {
    if header.is_tagged() {
        return Err(CryptoError::State("header tag already computed"));
    }
    if primitive.algorithm() != header.algorithm {
        return Err(CryptoError::AlgorithmMismatch { have: primitive.algorithm(), need: header.algorithm });
    }

    let iv = random_iv(header.algorithm.iv_len())?;
    let aad = serialize_authenticated_fields(header);
    let tag = primitive.tag_only(&iv, &aad)?;
    if tag.len() != HEADER_TAG_LEN {
        return Err(CryptoError::Failure(format!("header tag has {} bytes", tag.len())));
    }

    header.header_iv = iv;
    header.header_auth_tag = tag;
    Ok(())
}

/// Recompute the header tag and report the outcome with its cause.
pub fn check_header_tag(header: &EnvelopeHeader, primitive: &dyn AeadPrimitive) -> HeaderTagCheck {
    if primitive.algorithm() != header.algorithm {
        return HeaderTagCheck::Fault(CryptoError::AlgorithmMismatch {
            have: primitive.algorithm(),
            need: header.algorithm,
        });
    }
    if header.header_auth_tag.len() != HEADER_TAG_LEN {
        return HeaderTagCheck::Mismatch;
    }

    let aad = serialize_authenticated_fields(header);
    match primitive.tag_only(&header.header_iv, &aad) {
        Ok(expected) => {
            if bool::from(expected.as_slice().ct_eq(header.header_auth_tag.as_slice())) {
                HeaderTagCheck::Valid
            } else {
                HeaderTagCheck::Mismatch
            }
        }
        Err(e) => HeaderTagCheck::Fault(e),
    }
}

/// Fail-closed boolean view of `check_header_tag`.
pub fn verify_header_tag(header: &EnvelopeHeader, primitive: &dyn AeadPrimitive) -> bool {
    match check_header_tag(header, primitive) {
        HeaderTagCheck::Valid => true,
        HeaderTagCheck::Mismatch => false,
        HeaderTagCheck::Fault(cause) => {
            debug!(algorithm = %header.algorithm, %cause, "header tag could not be recomputed");
            false
        }
    }
}
