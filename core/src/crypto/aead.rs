// ## 📂 File: `src/crypto/aead.rs`

//! src/crypto/aead.rs
//! Uniform primitive interface over GCM, ChaCha20-Poly1305 and CBC.
//!
//! Design notes:
//! - One handler is bound to one algorithm and one raw data key.
//! - The same primitive serves two call sites: body AEAD and header MAC
//!   (`tag_only`, i.e. seal of an empty payload).
//! - Open is verify-then-release: no plaintext leaves on tag failure.
//! - Keys are zeroized when the handler drops; cipher instances are
//!   rebuilt per call and never cached.

use aes::{Aes128, Aes256};
use aes_gcm::aead::consts::{U12, U16};
use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::{Aead, AeadCore, AeadInPlace, KeyInit, Nonce, Payload};
use aes_gcm::AesGcm;
use cipher::block_padding::Pkcs7;
use cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use chacha20poly1305::ChaCha20Poly1305;
use sm4::Sm4;
use zeroize::Zeroizing;

use crate::crypto::algorithm::{Algorithm, CipherKind, CipherMode};
use crate::crypto::stream::{new_cbc_stream, new_chacha_stream, new_gcm_stream, StreamingCipher};
use crate::crypto::types::{CryptoError, Direction};

type Aes128Gcm = AesGcm<Aes128, U12>;
type Aes256Gcm = AesGcm<Aes256, U12>;
type Sm4Gcm = AesGcm<Sm4, U12>;

// Header-tag ciphers for CBC algorithms: GCM keyed identically, 16-byte IV.
type Aes128GcmWideIv = AesGcm<Aes128, U16>;
type Aes256GcmWideIv = AesGcm<Aes256, U16>;
type Sm4GcmWideIv = AesGcm<Sm4, U16>;

/// Keyed AEAD transform consumed by the envelope engine.
///
/// `aad = None` means "no associated data", which for GCM is the same as an
/// empty AAD but is kept distinct so call sites state their policy.
pub trait AeadPrimitive: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    /// Returns `ciphertext ‖ tag` (just ciphertext when `tag_len == 0`).
    fn seal(&self, iv: &[u8], aad: Option<&[u8]>, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Consumes `ciphertext ‖ tag`; never returns bytes on tag failure.
    fn open(&self, iv: &[u8], aad: Option<&[u8]>, ciphertext_and_tag: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Tag of an empty payload under `iv` and `aad`.
    fn tag_only(&self, iv: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Incremental transform with the same semantics as `seal`/`open`.
    fn start(&self, iv: &[u8], direction: Direction) -> Result<Box<dyn StreamingCipher>, CryptoError>;
}

/// Concrete primitive for every registered algorithm.
pub struct AlgorithmHandler {
    algorithm: Algorithm,
    key: Zeroizing<Vec<u8>>,
}

impl AlgorithmHandler {
    pub fn new(algorithm: Algorithm, key: &[u8]) -> Result<Self, CryptoError> {
        let expected = algorithm.key_len();
        if key.len() != expected {
            return Err(CryptoError::InvalidKeyLen { expected, actual: key.len() });
        }
        Ok(Self { algorithm, key: Zeroizing::new(key.to_vec()) })
    }

    fn check_iv(&self, iv: &[u8]) -> Result<(), CryptoError> {
        let expected = self.algorithm.iv_len();
        if iv.len() != expected {
            return Err(CryptoError::InvalidIvLen { expected, actual: iv.len() });
        }
        Ok(())
    }
}

impl std::fmt::Debug for AlgorithmHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmHandler")
            .field("algorithm", &self.algorithm)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl AeadPrimitive for AlgorithmHandler {
    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn seal(&self, iv: &[u8], aad: Option<&[u8]>, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.check_iv(iv)?;
        let aad = aad.unwrap_or_default();
        let spec = self.algorithm.spec();
        match (spec.cipher, spec.mode) {
            (CipherKind::Aes128, CipherMode::Gcm) => aead_seal::<Aes128Gcm>(&self.key, iv, aad, plaintext),
            (CipherKind::Aes256, CipherMode::Gcm) => aead_seal::<Aes256Gcm>(&self.key, iv, aad, plaintext),
            (CipherKind::Sm4, CipherMode::Gcm) => aead_seal::<Sm4Gcm>(&self.key, iv, aad, plaintext),
            (CipherKind::ChaCha20, _) => aead_seal::<ChaCha20Poly1305>(&self.key, iv, aad, plaintext),
            (CipherKind::Aes128, _) => cbc_seal::<Aes128>(&self.key, iv, plaintext),
            (CipherKind::Aes256, _) => cbc_seal::<Aes256>(&self.key, iv, plaintext),
            (CipherKind::Sm4, _) => cbc_seal::<Sm4>(&self.key, iv, plaintext),
        }
    }

    fn open(&self, iv: &[u8], aad: Option<&[u8]>, ciphertext_and_tag: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.check_iv(iv)?;
        let aad = aad.unwrap_or_default();
        let spec = self.algorithm.spec();
        match (spec.cipher, spec.mode) {
            (CipherKind::Aes128, CipherMode::Gcm) => aead_open::<Aes128Gcm>(&self.key, iv, aad, ciphertext_and_tag),
            (CipherKind::Aes256, CipherMode::Gcm) => aead_open::<Aes256Gcm>(&self.key, iv, aad, ciphertext_and_tag),
            (CipherKind::Sm4, CipherMode::Gcm) => aead_open::<Sm4Gcm>(&self.key, iv, aad, ciphertext_and_tag),
            (CipherKind::ChaCha20, _) => aead_open::<ChaCha20Poly1305>(&self.key, iv, aad, ciphertext_and_tag),
            (CipherKind::Aes128, _) => cbc_open::<Aes128>(&self.key, iv, ciphertext_and_tag),
            (CipherKind::Aes256, _) => cbc_open::<Aes256>(&self.key, iv, ciphertext_and_tag),
            (CipherKind::Sm4, _) => cbc_open::<Sm4>(&self.key, iv, ciphertext_and_tag),
        }
    }

    fn tag_only(&self, iv: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.check_iv(iv)?;
        let spec = self.algorithm.spec();
        match (spec.cipher, spec.mode) {
            (CipherKind::Aes128, CipherMode::Gcm) => aead_tag::<Aes128Gcm>(&self.key, iv, aad),
            (CipherKind::Aes256, CipherMode::Gcm) => aead_tag::<Aes256Gcm>(&self.key, iv, aad),
            (CipherKind::Sm4, CipherMode::Gcm) => aead_tag::<Sm4Gcm>(&self.key, iv, aad),
            (CipherKind::ChaCha20, _) => aead_tag::<ChaCha20Poly1305>(&self.key, iv, aad),
            (CipherKind::Aes128, _) => aead_tag::<Aes128GcmWideIv>(&self.key, iv, aad),
            (CipherKind::Aes256, _) => aead_tag::<Aes256GcmWideIv>(&self.key, iv, aad),
            (CipherKind::Sm4, _) => aead_tag::<Sm4GcmWideIv>(&self.key, iv, aad),
        }
    }

    fn start(&self, iv: &[u8], direction: Direction) -> Result<Box<dyn StreamingCipher>, CryptoError> {
        self.check_iv(iv)?;
        let spec = self.algorithm.spec();
        match (spec.cipher, spec.mode) {
            (CipherKind::Aes128, CipherMode::Gcm) => new_gcm_stream::<Aes128>(&self.key, iv, direction),
            (CipherKind::Aes256, CipherMode::Gcm) => new_gcm_stream::<Aes256>(&self.key, iv, direction),
            (CipherKind::Sm4, CipherMode::Gcm) => new_gcm_stream::<Sm4>(&self.key, iv, direction),
            (CipherKind::ChaCha20, _) => new_chacha_stream(&self.key, iv, direction),
            (CipherKind::Aes128, _) => new_cbc_stream::<Aes128>(&self.key, iv, direction),
            (CipherKind::Aes256, _) => new_cbc_stream::<Aes256>(&self.key, iv, direction),
            (CipherKind::Sm4, _) => new_cbc_stream::<Sm4>(&self.key, iv, direction),
        }
    }
}

// ================= one-shot helpers =================

fn build_aead<A: KeyInit>(key: &[u8]) -> Result<A, CryptoError> {
    A::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLen {
        expected: A::key_size(),
        actual: key.len(),
    })
}

fn nonce_of<A: AeadCore>(iv: &[u8]) -> Result<&Nonce<A>, CryptoError> {
    let expected = A::NonceSize::USIZE;
    if iv.len() != expected {
        return Err(CryptoError::InvalidIvLen { expected, actual: iv.len() });
    }
    Ok(Nonce::<A>::from_slice(iv))
}

fn aead_seal<A: KeyInit + Aead>(key: &[u8], iv: &[u8], aad: &[u8], msg: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = build_aead::<A>(key)?;
    cipher
        .encrypt(nonce_of::<A>(iv)?, Payload { msg, aad })
        .map_err(|_| CryptoError::Failure("AEAD seal failed".into()))
}

fn aead_open<A: KeyInit + Aead>(key: &[u8], iv: &[u8], aad: &[u8], msg: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let tag_len = A::TagSize::USIZE;
    if msg.len() < tag_len {
        return Err(CryptoError::Truncated { have: msg.len(), need: tag_len });
    }
    let cipher = build_aead::<A>(key)?;
    cipher
        .decrypt(nonce_of::<A>(iv)?, Payload { msg, aad })
        .map_err(|_| CryptoError::TagMismatch)
}

fn aead_tag<A: KeyInit + AeadInPlace>(key: &[u8], iv: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = build_aead::<A>(key)?;
    let mut empty: [u8; 0] = [];
    let tag = cipher
        .encrypt_in_place_detached(nonce_of::<A>(iv)?, aad, &mut empty)
        .map_err(|_| CryptoError::Failure("AEAD tag computation failed".into()))?;
    Ok(tag.to_vec())
}

fn cbc_seal<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    C: BlockCipher + BlockEncryptMut,
    cbc::Encryptor<C>: KeyIvInit + BlockEncryptMut,
{
    let enc = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CryptoError::Failure("CBC init failed".into()))?;
    Ok(enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn cbc_open<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    C: BlockCipher + BlockDecryptMut,
    cbc::Decryptor<C>: KeyIvInit + BlockDecryptMut,
{
    let dec = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CryptoError::Failure("CBC init failed".into()))?;
    dec.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::BadPadding)
}
