// # 🧪 Buffered envelope seal / open

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use envelope_core::constants::DEFAULT_CHUNK_SIZE;
    use envelope_core::crypto::{AeadPrimitive, Algorithm, AlgorithmHandler, CryptoError, Direction, StreamingCipher};
    use envelope_core::envelope::{BodyPayload, DecryptionMaterial, EncryptionMaterial, Envelope, EnvelopeBody};
    use envelope_core::engine::EnvelopeEngine;
    use envelope_core::headers::{EncryptedDataKey, EncryptionContext, HeaderLimits};
    use envelope_core::types::EnvelopeError;

    fn key_for(alg: Algorithm, seed: u8) -> Vec<u8> {
        (0..alg.key_len()).map(|i| seed.wrapping_add(i as u8)).collect()
    }

    fn context() -> EncryptionContext {
        [("app", "ledger"), ("region", "eu-west-1")].into_iter().collect()
    }

    fn enc_material(alg: Algorithm, key: &[u8]) -> EncryptionMaterial {
        EncryptionMaterial::new(
            alg,
            key,
            vec![EncryptedDataKey::new("master-1", vec![0x5A; 32])],
            context(),
        )
    }

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 256) as u8).collect()
    }

    fn sizes() -> [usize; 6] {
        [0, 1, DEFAULT_CHUNK_SIZE - 1, DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_SIZE + 1, 5 * DEFAULT_CHUNK_SIZE + 123]
    }

    /// Delegates to a real handler and counts every body-side call.
    struct CountingPrimitive {
        inner: AlgorithmHandler,
        body_calls: AtomicUsize,
    }

    impl CountingPrimitive {
        fn new(alg: Algorithm, key: &[u8]) -> Self {
            Self { inner: AlgorithmHandler::new(alg, key).unwrap(), body_calls: AtomicUsize::new(0) }
        }
        fn body_calls(&self) -> usize {
            self.body_calls.load(Ordering::SeqCst)
        }
    }

    impl AeadPrimitive for CountingPrimitive {
        fn algorithm(&self) -> Algorithm {
            self.inner.algorithm()
        }
        fn seal(&self, iv: &[u8], aad: Option<&[u8]>, pt: &[u8]) -> Result<Vec<u8>, CryptoError> {
            self.body_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.seal(iv, aad, pt)
        }
        fn open(&self, iv: &[u8], aad: Option<&[u8]>, ct: &[u8]) -> Result<Vec<u8>, CryptoError> {
            self.body_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.open(iv, aad, ct)
        }
        fn tag_only(&self, iv: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
            self.inner.tag_only(iv, aad)
        }
        fn start(&self, iv: &[u8], direction: Direction) -> Result<Box<dyn StreamingCipher>, CryptoError> {
            self.body_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.start(iv, direction)
        }
    }

// # ✅ 1. Round trip across algorithms and sizes

    #[test]
    fn roundtrip_all_algorithms_all_sizes() {
        let engine = EnvelopeEngine::default();
        for alg in Algorithm::ALL {
            let key = key_for(alg, 1);
            for len in sizes() {
                let pt = payload(len);
                let env = engine.encrypt(&pt, &enc_material(alg, &key)).unwrap();
                assert_eq!(env.body.iv.len(), alg.iv_len());
                assert_eq!(env.body.auth_tag().unwrap().len(), alg.tag_len());
                let back = engine.decrypt(&env, &DecryptionMaterial::new(alg, &key)).unwrap();
                assert_eq!(back, pt, "{alg} len={len}");
            }
        }
    }

    #[test]
    fn header_carries_material_fields() {
        let alg = Algorithm::Aes256GcmNoPadding;
        let key = key_for(alg, 2);
        let env = EnvelopeEngine::default().encrypt(b"x", &enc_material(alg, &key).with_version(3)).unwrap();
        assert_eq!(env.header.version, 3);
        assert_eq!(env.header.algorithm, alg);
        assert_eq!(env.header.encrypted_data_keys[0].key_id, "master-1");
        assert_eq!(env.header.encryption_context, context());
        assert_ne!(env.header.header_iv, env.body.iv);
    }

// # ✅ 2. Zero-tag algorithm

    #[test]
    fn zero_tag_algorithm_has_empty_tag_and_full_ciphertext() {
        for alg in [Algorithm::Aes128CbcPkcs7, Algorithm::Aes256CbcPkcs7, Algorithm::Sm4CbcPkcs7] {
            let key = key_for(alg, 3);
            let pt = payload(40);
            let env = EnvelopeEngine::default().encrypt(&pt, &enc_material(alg, &key)).unwrap();
            let ct = env.body.ciphertext().unwrap();
            assert!(env.body.auth_tag().unwrap().is_empty());

            let direct = AlgorithmHandler::new(alg, &key).unwrap().seal(&env.body.iv, None, &pt).unwrap();
            assert_eq!(ct, direct.as_slice(), "ciphertext is the whole primitive output");
            assert_eq!(ct.len(), 48);

            let back = EnvelopeEngine::default().decrypt(&env, &DecryptionMaterial::new(alg, &key)).unwrap();
            assert_eq!(back, pt);
        }
    }

// # ✅ 3. Body IVs are unique

    #[test]
    fn body_ivs_pairwise_distinct() {
        let alg = Algorithm::Aes128GcmNoPadding;
        let key = key_for(alg, 4);
        let engine = EnvelopeEngine::default();
        let material = enc_material(alg, &key);
        let mut seen = HashSet::new();
        for _ in 0..2000 {
            let env = engine.encrypt(b"same plaintext", &material).unwrap();
            assert!(seen.insert(env.body.iv.clone()), "body IV repeated");
            assert!(seen.insert(env.header.header_iv.clone()), "header IV collided");
        }
    }

// # ❌ 4. Header integrity

    #[test]
    fn wrong_key_fails_before_body_is_touched() {
        for alg in Algorithm::ALL {
            let env = EnvelopeEngine::default().encrypt(b"secret", &enc_material(alg, &key_for(alg, 5))).unwrap();
            let wrong = CountingPrimitive::new(alg, &key_for(alg, 6));
            let err = EnvelopeEngine::default()
                .decrypt_with(&wrong, &env, &DecryptionMaterial::new(alg, &key_for(alg, 6)))
                .unwrap_err();
            assert!(matches!(err, EnvelopeError::HeaderIntegrity), "{alg}: {err}");
            assert_eq!(wrong.body_calls(), 0, "{alg}: body processed after header failure");
        }
    }

    #[test]
    fn right_key_through_counting_primitive_opens_once() {
        let alg = Algorithm::Sm4GcmNoPadding;
        let key = key_for(alg, 7);
        let p = CountingPrimitive::new(alg, &key);
        let engine = EnvelopeEngine::default();
        let env = engine.encrypt_with(&p, b"abc", &enc_material(alg, &key)).unwrap();
        assert_eq!(p.body_calls(), 1);
        let back = engine.decrypt_with(&p, &env, &DecryptionMaterial::new(alg, &key)).unwrap();
        assert_eq!(back, b"abc");
        assert_eq!(p.body_calls(), 2);
    }

    #[test]
    fn tampered_header_fields_fail_with_header_integrity() {
        let alg = Algorithm::ChaCha20Poly1305;
        let key = key_for(alg, 8);
        let engine = EnvelopeEngine::default();
        let env = engine.encrypt(b"payload", &enc_material(alg, &key)).unwrap();
        let dm = DecryptionMaterial::new(alg, &key);
        assert!(engine.decrypt(&env, &dm).is_ok());

        let mut tampered: Vec<Envelope> = Vec::new();
        let mut e = env.clone();
        e.header.version += 1;
        tampered.push(e);
        let mut e = env.clone();
        e.header.algorithm = Algorithm::Aes256GcmNoPadding;
        tampered.push(e);
        let mut e = env.clone();
        e.header.encrypted_data_keys[0].data_key[31] ^= 0x40;
        tampered.push(e);
        let mut e = env.clone();
        e.header.encrypted_data_keys.push(EncryptedDataKey::new("extra", vec![1]));
        tampered.push(e);
        let mut e = env.clone();
        e.header.encryption_context.insert("app", "payroll");
        tampered.push(e);

        for (i, e) in tampered.iter().enumerate() {
            let err = engine.decrypt(e, &dm).unwrap_err();
            assert!(matches!(err, EnvelopeError::HeaderIntegrity), "case {i}: {err}");
        }
    }

    #[test]
    fn material_algorithm_mismatch_fails_closed() {
        let key = key_for(Algorithm::Aes256GcmNoPadding, 9);
        let env = EnvelopeEngine::default().encrypt(b"x", &enc_material(Algorithm::Aes256GcmNoPadding, &key)).unwrap();
        let err = EnvelopeEngine::default()
            .decrypt(&env, &DecryptionMaterial::new(Algorithm::ChaCha20Poly1305, &key))
            .unwrap_err();
        assert!(matches!(err, EnvelopeError::HeaderIntegrity));
    }

    #[test]
    fn required_context_must_match_header() {
        let alg = Algorithm::Aes128GcmNoPadding;
        let key = key_for(alg, 10);
        let engine = EnvelopeEngine::default();
        let env = engine.encrypt(b"x", &enc_material(alg, &key)).unwrap();

        let ok: EncryptionContext = [("app", "ledger")].into_iter().collect();
        assert!(engine.decrypt(&env, &DecryptionMaterial::new(alg, &key).with_required_context(ok)).is_ok());

        let bad: EncryptionContext = [("app", "payroll")].into_iter().collect();
        let err = engine
            .decrypt(&env, &DecryptionMaterial::new(alg, &key).with_required_context(bad))
            .unwrap_err();
        assert!(matches!(err, EnvelopeError::Validation(_)));
    }

// # ❌ 5. Body integrity and malformed bodies

    fn flip_inline(env: &Envelope, f: impl FnOnce(&mut Vec<u8>, &mut Vec<u8>)) -> Envelope {
        let mut e = env.clone();
        if let BodyPayload::Inline { ciphertext, auth_tag } = &mut e.body.payload {
            f(ciphertext, auth_tag);
        }
        e
    }

    #[test]
    fn flipped_ciphertext_or_tag_bit_is_body_integrity_failure() {
        let engine = EnvelopeEngine::default();
        for alg in Algorithm::ALL.into_iter().filter(|a| a.tag_len() > 0) {
            let key = key_for(alg, 11);
            let env = engine.encrypt(&payload(300), &enc_material(alg, &key)).unwrap();
            let dm = DecryptionMaterial::new(alg, &key);

            for pos in [0usize, 150, 299] {
                let e = flip_inline(&env, |ct, _| ct[pos] ^= 0x01);
                assert!(matches!(engine.decrypt(&e, &dm), Err(EnvelopeError::BodyIntegrity(_))), "{alg} ct[{pos}]");
            }
            for pos in [0usize, 15] {
                let e = flip_inline(&env, |_, tag| tag[pos] ^= 0x80);
                assert!(matches!(engine.decrypt(&e, &dm), Err(EnvelopeError::BodyIntegrity(_))), "{alg} tag[{pos}]");
            }
            let mut e = env.clone();
            e.body.iv[0] ^= 0x01;
            assert!(matches!(engine.decrypt(&e, &dm), Err(EnvelopeError::BodyIntegrity(_))), "{alg} iv");
        }
    }

    #[test]
    fn context_is_bound_into_body_aad() {
        // Re-tag a header with a different context but keep the body:
        // the header passes, the body AAD no longer matches.
        let alg = Algorithm::Aes256GcmNoPadding;
        let key = key_for(alg, 12);
        let engine = EnvelopeEngine::default();
        let env = engine.encrypt(b"bound", &enc_material(alg, &key)).unwrap();

        let mut other = enc_material(alg, &key);
        other.encryption_context.insert("app", "other");
        let donor = engine.encrypt(b"", &other).unwrap();

        let forged = Envelope::new(donor.header, env.body.clone());
        let err = engine.decrypt(&forged, &DecryptionMaterial::new(alg, &key)).unwrap_err();
        assert!(matches!(err, EnvelopeError::BodyIntegrity(_)));
    }

    #[test]
    fn wrong_tag_length_is_malformed() {
        let alg = Algorithm::Aes128GcmNoPadding;
        let key = key_for(alg, 13);
        let engine = EnvelopeEngine::default();
        let env = engine.encrypt(b"hello", &enc_material(alg, &key)).unwrap();
        let e = flip_inline(&env, |_, tag| {
            tag.pop();
        });
        let err = engine.decrypt(&e, &DecryptionMaterial::new(alg, &key)).unwrap_err();
        assert!(matches!(err, EnvelopeError::Malformed(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn streamed_body_cannot_be_opened_in_buffered_mode() {
        let alg = Algorithm::Aes128GcmNoPadding;
        let key = key_for(alg, 14);
        let engine = EnvelopeEngine::default();
        let env = engine.encrypt(b"hello", &enc_material(alg, &key)).unwrap();
        let streamed = Envelope::new(env.header.clone(), EnvelopeBody::streamed(env.body.iv.clone()));
        let err = engine.decrypt(&streamed, &DecryptionMaterial::new(alg, &key)).unwrap_err();
        assert!(matches!(err, EnvelopeError::Validation(_)));
        assert!(matches!(streamed.to_bytes(), Err(EnvelopeError::Validation(_))));
    }

    #[test]
    fn bad_key_length_is_a_crypto_error() {
        let err = EnvelopeEngine::default()
            .encrypt(b"x", &enc_material(Algorithm::Aes256GcmNoPadding, &[0u8; 16]))
            .unwrap_err();
        assert!(matches!(err, EnvelopeError::Crypto(CryptoError::InvalidKeyLen { .. })));
    }

// # ✅ 6. Whole-envelope serialization

    #[test]
    fn envelope_bytes_roundtrip_and_open() {
        let engine = EnvelopeEngine::default();
        for alg in Algorithm::ALL {
            let key = key_for(alg, 15);
            let pt = payload(777);
            let env = engine.encrypt(&pt, &enc_material(alg, &key)).unwrap();
            let bytes = env.to_bytes().unwrap();
            let back = Envelope::from_bytes(&bytes, &HeaderLimits::default()).unwrap();
            assert_eq!(back, env);
            assert_eq!(engine.decrypt(&back, &DecryptionMaterial::new(alg, &key)).unwrap(), pt);
        }
    }

    #[test]
    fn envelope_bytes_reject_truncation_and_trailing() {
        let alg = Algorithm::Aes128GcmNoPadding;
        let env = EnvelopeEngine::default().encrypt(b"abc", &enc_material(alg, &key_for(alg, 16))).unwrap();
        let bytes = env.to_bytes().unwrap();
        let limits = HeaderLimits::default();

        let mut extra = bytes.clone();
        extra.push(0);
        assert!(matches!(Envelope::from_bytes(&extra, &limits), Err(EnvelopeError::Malformed(_))));

        let cut = &bytes[..bytes.len() - 1];
        assert!(matches!(Envelope::from_bytes(cut, &limits), Err(EnvelopeError::Malformed(_))));

        assert!(matches!(Envelope::from_bytes(&bytes[..3], &limits), Err(EnvelopeError::Header(_))));
    }

    #[test]
    fn oversized_material_rejected_at_seal() {
        let alg = Algorithm::Aes128GcmNoPadding;
        let key = key_for(alg, 17);
        let many: Vec<EncryptedDataKey> = (0..65).map(|i| EncryptedDataKey::new(format!("k{i}"), vec![i as u8])).collect();
        let material = EncryptionMaterial::new(alg, &key, many, EncryptionContext::new());
        let err = EnvelopeEngine::default().encrypt(b"x", &material).unwrap_err();
        assert!(matches!(err, EnvelopeError::Validation(_)));
    }

    #[test]
    fn material_debug_hides_key() {
        let m = enc_material(Algorithm::Aes128GcmNoPadding, &[0xEE; 16]);
        let s = format!("{:?}", m);
        assert!(s.contains("<redacted>"));
        assert!(!s.contains("238"));
    }
}
