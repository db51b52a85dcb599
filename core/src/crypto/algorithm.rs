// ## 📂 File: `src/crypto/algorithm.rs`

//! crypto/algorithm.rs
//! Algorithm registry and immutable per-algorithm descriptors.
//!
//! Design notes:
//! - The wire id is the `#[repr(u16)]` discriminant; never renumber.
//! - `AlgorithmSpec` is selected once per message and never mutated.
//! - CBC algorithms carry no tag and do not bind AAD into the body; their
//!   header tag is still a GCM tag over the same block cipher and key.

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::constants::algorithm_ids;
use crate::crypto::types::{CryptoError, IV_LEN_12, IV_LEN_16, TAG_LEN};

/// Algorithm registry (header field `algorithm`).
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
pub enum Algorithm {
    Aes128GcmNoPadding = algorithm_ids::AES128_GCM,
    Aes256GcmNoPadding = algorithm_ids::AES256_GCM,
    Aes128CbcPkcs7     = algorithm_ids::AES128_CBC_PKCS7,
    Aes256CbcPkcs7     = algorithm_ids::AES256_CBC_PKCS7,
    Sm4GcmNoPadding    = algorithm_ids::SM4_GCM,
    Sm4CbcPkcs7        = algorithm_ids::SM4_CBC_PKCS7,
    ChaCha20Poly1305   = algorithm_ids::CHACHA20_POLY1305,
}

/// Block cipher (or stream cipher) underneath an algorithm.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CipherKind {
    Aes128,
    Aes256,
    Sm4,
    ChaCha20,
}

/// Mode of operation for the body.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CipherMode {
    Gcm,
    CbcPkcs7,
    ChaChaPoly,
}

/// Immutable descriptor: lengths and AAD policy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AlgorithmSpec {
    pub key_len: usize,
    pub iv_len: usize,
    /// 0 for non-AEAD algorithms.
    pub tag_len: usize,
    pub with_aad: bool,
    pub cipher: CipherKind,
    pub mode: CipherMode,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::Aes128GcmNoPadding,
        Algorithm::Aes256GcmNoPadding,
        Algorithm::Aes128CbcPkcs7,
        Algorithm::Aes256CbcPkcs7,
        Algorithm::Sm4GcmNoPadding,
        Algorithm::Sm4CbcPkcs7,
        Algorithm::ChaCha20Poly1305,
    ];

    pub fn from_id(raw: u16) -> Result<Self, CryptoError> {
        Algorithm::try_from_primitive(raw).map_err(|_| CryptoError::UnsupportedAlgorithm { raw })
    }

    #[inline]
    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn spec(self) -> AlgorithmSpec {
        use Algorithm::*;
        use CipherKind::*;
        match self {
            Aes128GcmNoPadding => AlgorithmSpec::aead(16, Aes128, CipherMode::Gcm),
            Aes256GcmNoPadding => AlgorithmSpec::aead(32, Aes256, CipherMode::Gcm),
            Sm4GcmNoPadding    => AlgorithmSpec::aead(16, Sm4, CipherMode::Gcm),
            ChaCha20Poly1305   => AlgorithmSpec::aead(32, ChaCha20, CipherMode::ChaChaPoly),
            Aes128CbcPkcs7     => AlgorithmSpec::cbc(16, Aes128),
            Aes256CbcPkcs7     => AlgorithmSpec::cbc(32, Aes256),
            Sm4CbcPkcs7        => AlgorithmSpec::cbc(16, Sm4),
        }
    }

    pub fn key_len(self) -> usize { self.spec().key_len }
    pub fn iv_len(self) -> usize { self.spec().iv_len }
    pub fn tag_len(self) -> usize { self.spec().tag_len }
    pub fn with_aad(self) -> bool { self.spec().with_aad }
}

impl AlgorithmSpec {
    const fn aead(key_len: usize, cipher: CipherKind, mode: CipherMode) -> Self {
        Self { key_len, iv_len: IV_LEN_12, tag_len: TAG_LEN, with_aad: true, cipher, mode }
    }

    const fn cbc(key_len: usize, cipher: CipherKind) -> Self {
        Self { key_len, iv_len: IV_LEN_16, tag_len: 0, with_aad: false, cipher, mode: CipherMode::CbcPkcs7 }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Algorithm::Aes128GcmNoPadding => "AES_GCM_NOPADDING_128",
            Algorithm::Aes256GcmNoPadding => "AES_GCM_NOPADDING_256",
            Algorithm::Aes128CbcPkcs7     => "AES_CBC_PKCS7_128",
            Algorithm::Aes256CbcPkcs7     => "AES_CBC_PKCS7_256",
            Algorithm::Sm4GcmNoPadding    => "SM4_GCM_NOPADDING_128",
            Algorithm::Sm4CbcPkcs7        => "SM4_CBC_PKCS7_128",
            Algorithm::ChaCha20Poly1305   => "CHACHA20_POLY1305",
        };
        f.write_str(name)
    }
}
