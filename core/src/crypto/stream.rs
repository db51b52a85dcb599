// ## 📂 File: `src/crypto/stream.rs`

//! crypto/stream.rs
//! Incremental (init / update / finalize) ciphers.
//!
//! Design notes:
//! - Output is byte-identical to the one-shot primitive for the same
//!   key, IV and AAD: `ciphertext ‖ tag` on seal, plaintext on open.
//! - GCM and ChaCha20-Poly1305 share one engine: a keystream plus a
//!   16-byte universal hash (GHASH / Poly1305) and a length block.
//! - Open releases plaintext before the tag is checked (the tag is only
//!   known at end of stream). Callers must discard output when
//!   `finalize` fails.
//! - On open the last `tag_len` bytes seen are always withheld: they may
//!   be the tag.

use cipher::consts::U16;
use cipher::generic_array::GenericArray;
use cipher::{BlockCipher, BlockDecrypt, BlockEncrypt, BlockSizeUser, KeyInit, KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use ctr::Ctr32BE;
use ghash::GHash;
use poly1305::universal_hash::UniversalHash;
use poly1305::Poly1305;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::crypto::types::{CryptoError, Direction, BLOCK_LEN, IV_LEN_12, TAG_LEN};

/// Streaming half of the AEAD primitive.
pub trait StreamingCipher: Send {
    /// Must be called before the first `update`.
    fn update_aad(&mut self, aad: &[u8]) -> Result<(), CryptoError>;

    /// Transform one chunk; may return fewer bytes than it was given.
    fn update(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Flush trailing bytes. Seal: emits the tag (or the final padded
    /// block). Open: verifies the tag, returns what was held back.
    fn finalize(self: Box<Self>) -> Result<Vec<u8>, CryptoError>;
}

// ================= AEAD stream (GCM / ChaCha20-Poly1305) =================

#[derive(Clone, Copy)]
enum LengthBlock {
    /// GCM: bit lengths, big-endian.
    BitsBe,
    /// RFC 8439: byte lengths, little-endian.
    BytesLe,
}

struct AeadStream<M: UniversalHash> {
    direction: Direction,
    keystream: Box<dyn StreamCipher + Send>,
    mac: M,
    /// GCM: E(K, J0). ChaCha20-Poly1305: none.
    tag_mask: Option<[u8; TAG_LEN]>,
    lengths: LengthBlock,
    aad: Vec<u8>,
    aad_sealed: bool,
    aad_len: u64,
    data_len: u64,
    /// Ciphertext bytes not yet forming a whole MAC block.
    pending: Vec<u8>,
    /// Open only: trailing bytes that may be the tag.
    held: Vec<u8>,
}

impl<M: UniversalHash<BlockSize = U16> + Send> AeadStream<M> {
    fn seal_aad(&mut self) {
        if !self.aad_sealed {
            self.mac.update_padded(&self.aad);
            self.aad_len = self.aad.len() as u64;
            self.aad_sealed = true;
        }
    }

    fn absorb(&mut self, ciphertext: &[u8]) {
        self.pending.extend_from_slice(ciphertext);
        let whole = self.pending.len() / BLOCK_LEN * BLOCK_LEN;
        if whole > 0 {
            self.mac.update_padded(&self.pending[..whole]);
            self.pending.drain(..whole);
        }
        self.data_len += ciphertext.len() as u64;
    }

    fn compute_tag(mut self) -> [u8; TAG_LEN] {
        self.seal_aad();
        self.mac.update_padded(&self.pending);

        let mut len_block = [0u8; BLOCK_LEN];
        match self.lengths {
            LengthBlock::BitsBe => {
                len_block[..8].copy_from_slice(&(self.aad_len * 8).to_be_bytes());
                len_block[8..].copy_from_slice(&(self.data_len * 8).to_be_bytes());
            }
            LengthBlock::BytesLe => {
                len_block[..8].copy_from_slice(&self.aad_len.to_le_bytes());
                len_block[8..].copy_from_slice(&self.data_len.to_le_bytes());
            }
        }
        self.mac.update_padded(&len_block);

        let digest = self.mac.finalize();
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&digest);
        if let Some(mask) = self.tag_mask {
            for (t, m) in tag.iter_mut().zip(mask.iter()) {
                *t ^= m;
            }
        }
        tag
    }
}

impl<M: UniversalHash<BlockSize = U16> + Send> StreamingCipher for AeadStream<M> {
    fn update_aad(&mut self, aad: &[u8]) -> Result<(), CryptoError> {
        if self.aad_sealed {
            return Err(CryptoError::State("AAD must precede data"));
        }
        self.aad.extend_from_slice(aad);
        Ok(())
    }

    fn update(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.seal_aad();
        match self.direction {
            Direction::Seal => {
                let mut out = chunk.to_vec();
                self.keystream.apply_keystream(&mut out);
                self.absorb(&out);
                Ok(out)
            }
            Direction::Open => {
                self.held.extend_from_slice(chunk);
                if self.held.len() <= TAG_LEN {
                    return Ok(Vec::new());
                }
                let ready = self.held.len() - TAG_LEN;
                let mut out: Vec<u8> = self.held.drain(..ready).collect();
                self.absorb(&out);
                self.keystream.apply_keystream(&mut out);
                Ok(out)
            }
        }
    }

    fn finalize(self: Box<Self>) -> Result<Vec<u8>, CryptoError> {
        let mut this = *self;
        match this.direction {
            Direction::Seal => Ok(this.compute_tag().to_vec()),
            Direction::Open => {
                if this.held.len() != TAG_LEN {
                    return Err(CryptoError::Truncated { have: this.held.len(), need: TAG_LEN });
                }
                let received = std::mem::take(&mut this.held);
                let expected = this.compute_tag();
                if bool::from(expected.as_slice().ct_eq(received.as_slice())) {
                    Ok(Vec::new())
                } else {
                    Err(CryptoError::TagMismatch)
                }
            }
        }
    }
}

/// Streaming GCM over any 128-bit block cipher (AES-128/256, SM4).
/// Only 96-bit IVs are accepted: J0 = IV ‖ 0^31 ‖ 1.
pub fn new_gcm_stream<C>(key: &[u8], iv: &[u8], direction: Direction) -> Result<Box<dyn StreamingCipher>, CryptoError>
where
    C: BlockCipher + BlockEncrypt + KeyInit + BlockSizeUser<BlockSize = U16>,
    Ctr32BE<C>: KeyIvInit + StreamCipher + Send + 'static,
{
    if iv.len() != IV_LEN_12 {
        return Err(CryptoError::InvalidIvLen { expected: IV_LEN_12, actual: iv.len() });
    }
    let cipher = C::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLen {
        expected: C::key_size(),
        actual: key.len(),
    })?;

    // H = E(K, 0^128)
    let mut h = GenericArray::<u8, U16>::default();
    cipher.encrypt_block(&mut h);
    let mac = GHash::new(&h);

    let mut j0 = [0u8; BLOCK_LEN];
    j0[..IV_LEN_12].copy_from_slice(iv);
    j0[15] = 1;

    let mut mask = GenericArray::<u8, U16>::clone_from_slice(&j0);
    cipher.encrypt_block(&mut mask);
    let mut tag_mask = [0u8; TAG_LEN];
    tag_mask.copy_from_slice(&mask);

    // Payload keystream starts at inc32(J0).
    let mut counter = j0;
    counter[15] = 2;
    let keystream = Ctr32BE::<C>::new_from_slices(key, &counter)
        .map_err(|_| CryptoError::Failure("CTR init failed".into()))?;

    Ok(Box::new(AeadStream {
        direction,
        keystream: Box::new(keystream),
        mac,
        tag_mask: Some(tag_mask),
        lengths: LengthBlock::BitsBe,
        aad: Vec::new(),
        aad_sealed: false,
        aad_len: 0,
        data_len: 0,
        pending: Vec::new(),
        held: Vec::new(),
    }))
}

/// Streaming ChaCha20-Poly1305 (RFC 8439).
pub fn new_chacha_stream(key: &[u8], iv: &[u8], direction: Direction) -> Result<Box<dyn StreamingCipher>, CryptoError> {
    if iv.len() != IV_LEN_12 {
        return Err(CryptoError::InvalidIvLen { expected: IV_LEN_12, actual: iv.len() });
    }
    let mut keystream = ChaCha20::new_from_slices(key, iv)
        .map_err(|_| CryptoError::InvalidKeyLen { expected: 32, actual: key.len() })?;

    // Block 0 keys Poly1305; payload starts at block 1.
    let mut block0 = Zeroizing::new([0u8; 64]);
    keystream.apply_keystream(block0.as_mut_slice());
    let mac = Poly1305::new(poly1305::Key::from_slice(&block0[..32]));

    Ok(Box::new(AeadStream {
        direction,
        keystream: Box::new(keystream),
        mac,
        tag_mask: None,
        lengths: LengthBlock::BytesLe,
        aad: Vec::new(),
        aad_sealed: false,
        aad_len: 0,
        data_len: 0,
        pending: Vec::new(),
        held: Vec::new(),
    }))
}

// ================= CBC / PKCS#7 stream =================

struct CbcStream<C> {
    direction: Direction,
    cipher: C,
    chain: [u8; BLOCK_LEN],
    buf: Vec<u8>,
}

impl<C> CbcStream<C>
where
    C: BlockEncrypt + BlockDecrypt + BlockSizeUser<BlockSize = U16>,
{
    fn encrypt_block(&mut self, block: &[u8]) -> [u8; BLOCK_LEN] {
        let mut b = GenericArray::<u8, U16>::default();
        for i in 0..BLOCK_LEN {
            b[i] = block[i] ^ self.chain[i];
        }
        self.cipher.encrypt_block(&mut b);
        self.chain.copy_from_slice(&b);
        self.chain
    }

    fn decrypt_block(&mut self, block: &[u8]) -> [u8; BLOCK_LEN] {
        let mut b = GenericArray::<u8, U16>::clone_from_slice(block);
        self.cipher.decrypt_block(&mut b);
        let mut out = [0u8; BLOCK_LEN];
        for i in 0..BLOCK_LEN {
            out[i] = b[i] ^ self.chain[i];
        }
        self.chain.copy_from_slice(block);
        out
    }
}

impl<C> StreamingCipher for CbcStream<C>
where
    C: BlockEncrypt + BlockDecrypt + BlockSizeUser<BlockSize = U16> + Send,
{
    fn update_aad(&mut self, _aad: &[u8]) -> Result<(), CryptoError> {
        Err(CryptoError::State("CBC does not take associated data"))
    }

    fn update(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.buf.extend_from_slice(chunk);
        // Open keeps the final block back: it carries the padding.
        let keep = match self.direction {
            Direction::Seal => self.buf.len() % BLOCK_LEN,
            Direction::Open => match self.buf.len() % BLOCK_LEN {
                0 if !self.buf.is_empty() => BLOCK_LEN,
                r => r,
            },
        };
        let ready = self.buf.len() - keep;
        let input: Vec<u8> = self.buf.drain(..ready).collect();
        let mut out = Vec::with_capacity(ready);
        for block in input.chunks_exact(BLOCK_LEN) {
            let b = match self.direction {
                Direction::Seal => self.encrypt_block(block),
                Direction::Open => self.decrypt_block(block),
            };
            out.extend_from_slice(&b);
        }
        Ok(out)
    }

    fn finalize(self: Box<Self>) -> Result<Vec<u8>, CryptoError> {
        let mut this = *self;
        let rest = std::mem::take(&mut this.buf);
        match this.direction {
            Direction::Seal => {
                let pad = BLOCK_LEN - rest.len();
                let mut last = rest;
                last.resize(BLOCK_LEN, pad as u8);
                Ok(this.encrypt_block(&last).to_vec())
            }
            Direction::Open => {
                if rest.len() != BLOCK_LEN {
                    return Err(CryptoError::Truncated { have: rest.len(), need: BLOCK_LEN });
                }
                let last = this.decrypt_block(&rest);
                let pad = last[BLOCK_LEN - 1] as usize;
                if pad == 0 || pad > BLOCK_LEN || last[BLOCK_LEN - pad..].iter().any(|&b| b as usize != pad) {
                    return Err(CryptoError::BadPadding);
                }
                Ok(last[..BLOCK_LEN - pad].to_vec())
            }
        }
    }
}

/// Streaming CBC with PKCS#7 padding over a 128-bit block cipher.
pub fn new_cbc_stream<C>(key: &[u8], iv: &[u8], direction: Direction) -> Result<Box<dyn StreamingCipher>, CryptoError>
where
    C: BlockCipher + BlockEncrypt + BlockDecrypt + KeyInit + BlockSizeUser<BlockSize = U16> + Send + 'static,
{
    if iv.len() != BLOCK_LEN {
        return Err(CryptoError::InvalidIvLen { expected: BLOCK_LEN, actual: iv.len() });
    }
    let cipher = C::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLen {
        expected: C::key_size(),
        actual: key.len(),
    })?;
    let mut chain = [0u8; BLOCK_LEN];
    chain.copy_from_slice(iv);
    Ok(Box::new(CbcStream { direction, cipher, chain, buf: Vec::new() }))
}
