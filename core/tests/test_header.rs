// This suite pins the header wire format and the header tag protocol:

// * canonical context serialization
// * exact authenticated-field layout
// * decode rejection of malformed input
// * tamper detection through the header tag

#[cfg(test)]
mod tests {

use envelope_core::constants::MAGIC_AEH1;
use envelope_core::crypto::{Algorithm, AlgorithmHandler, CryptoError};
use envelope_core::headers::{
    check_header_tag, compute_header_tag, decode_header, encode_header, encoded_len, read_header,
    serialize_authenticated_fields, verify_header_tag, EncryptedDataKey, EncryptionContext, EnvelopeHeader,
    HeaderError, HeaderLimits, HeaderTagCheck,
};

    fn ctx() -> EncryptionContext {
        [("tenant", "acme"), ("purpose", "backup")].into_iter().collect()
    }

    fn tagged(alg: Algorithm, key: &[u8]) -> EnvelopeHeader {
        let mut h = EnvelopeHeader::new(
            1,
            alg,
            vec![EncryptedDataKey::new("kms:key-1", vec![0xAA; 40]), EncryptedDataKey::new("kms:key-2", vec![0xBB; 8])],
            ctx(),
        );
        let p = AlgorithmHandler::new(alg, key).unwrap();
        compute_header_tag(&mut h, &p).unwrap();
        h
    }

// ## 1️⃣ Canonical serialization

    #[test]
    fn context_serialization_is_sorted_and_length_prefixed() {
        let c: EncryptionContext = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(
            hex::encode(c.serialize()),
            "00000002\
             00000001 61 00000001 31\
             00000001 62 00000001 32"
                .replace(' ', "")
        );
        assert_eq!(c.serialized_len(), c.serialize().len());
    }

    #[test]
    fn context_serialization_ignores_insertion_order() {
        let mut a = EncryptionContext::new();
        a.insert("x", "1");
        a.insert("y", "2");
        let mut b = EncryptionContext::new();
        b.insert("y", "2");
        b.insert("x", "1");
        assert_eq!(a.serialize(), b.serialize());
    }

    #[test]
    fn empty_context_is_a_zero_count() {
        assert_eq!(EncryptionContext::new().serialize(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn authenticated_fields_layout() {
        let h = EnvelopeHeader::new(
            1,
            Algorithm::Aes256GcmNoPadding,
            vec![EncryptedDataKey::new("k", vec![0xAA])],
            EncryptionContext::new(),
        );
        assert_eq!(
            hex::encode(serialize_authenticated_fields(&h)),
            "00000001 0002 00000001 00000001 6b 00000001 aa 00000000".replace(' ', "")
        );
    }

// ## 2️⃣ Wire codec

    #[test]
    fn encode_decode_preserves_every_field() {
        let h = tagged(Algorithm::Sm4GcmNoPadding, &[7u8; 16]);
        let wire = encode_header(&h).unwrap();
        assert_eq!(&wire[..4], &MAGIC_AEH1);
        assert_eq!(wire.len(), encoded_len(&h));

        let (back, used) = decode_header(&wire, &HeaderLimits::default()).unwrap();
        assert_eq!(used, wire.len());
        assert_eq!(back, h);
    }

    #[test]
    fn decode_reports_consumed_bytes_with_trailing_body() {
        let h = tagged(Algorithm::Aes128CbcPkcs7, &[1u8; 16]);
        let mut wire = encode_header(&h).unwrap();
        let header_len = wire.len();
        wire.extend_from_slice(b"body bytes");
        let (_, used) = decode_header(&wire, &HeaderLimits::default()).unwrap();
        assert_eq!(used, header_len);
    }

    #[test]
    fn read_header_leaves_reader_at_body() {
        let h = tagged(Algorithm::ChaCha20Poly1305, &[9u8; 32]);
        let mut wire = encode_header(&h).unwrap();
        wire.extend_from_slice(b"REST");
        let mut cursor = std::io::Cursor::new(wire);
        let (back, _) = read_header(&mut cursor, &HeaderLimits::default()).unwrap();
        assert_eq!(back, h);
        let mut rest = Vec::new();
        std::io::Read::read_to_end(&mut cursor, &mut rest).unwrap();
        assert_eq!(rest, b"REST");
    }

    #[test]
    fn encode_untagged_header_fails() {
        let h = EnvelopeHeader::v1(Algorithm::Aes128GcmNoPadding);
        assert!(matches!(encode_header(&h), Err(HeaderError::Untagged)));
    }

// ## 3️⃣ Decode failures

    #[test]
    fn every_truncation_is_rejected() {
        let wire = encode_header(&tagged(Algorithm::Aes256GcmNoPadding, &[3u8; 32])).unwrap();
        for cut in 0..wire.len() {
            match decode_header(&wire[..cut], &HeaderLimits::default()) {
                Err(HeaderError::BufferTooShort { .. }) => {}
                other => panic!("cut={cut}: expected BufferTooShort, got {other:?}"),
            }
        }
    }

    #[test]
    fn bad_magic_rejected() {
        let mut wire = encode_header(&tagged(Algorithm::Aes256GcmNoPadding, &[3u8; 32])).unwrap();
        wire[0] = b'X';
        let err = decode_header(&wire, &HeaderLimits::default()).unwrap_err();
        assert!(matches!(err, HeaderError::InvalidMagic { .. }));
        assert!(err.to_string().contains("invalid magic"));
    }

    #[test]
    fn unknown_algorithm_rejected() {
        let mut wire = encode_header(&tagged(Algorithm::Aes256GcmNoPadding, &[3u8; 32])).unwrap();
        // magic(4) + version(4)
        wire[8] = 0x00;
        wire[9] = 0xFF;
        let err = decode_header(&wire, &HeaderLimits::default()).unwrap_err();
        assert!(matches!(err, HeaderError::UnknownAlgorithm { raw: 0x00FF }));
        assert_eq!(err.to_string(), "unknown algorithm: 0xff");
    }

    #[test]
    fn oversized_key_count_rejected_before_allocation() {
        let mut wire = encode_header(&tagged(Algorithm::Aes256GcmNoPadding, &[3u8; 32])).unwrap();
        // magic(4) + version(4) + alg(2)
        wire[10..14].copy_from_slice(&u32::MAX.to_be_bytes());
        let err = decode_header(&wire, &HeaderLimits::default()).unwrap_err();
        assert!(matches!(err, HeaderError::TooManyDataKeys { .. }));
    }

    #[test]
    fn oversized_field_rejected() {
        let mut wire = encode_header(&tagged(Algorithm::Aes256GcmNoPadding, &[3u8; 32])).unwrap();
        // first key_id length prefix
        wire[14..18].copy_from_slice(&0x7FFF_FFFFu32.to_be_bytes());
        let err = decode_header(&wire, &HeaderLimits::default()).unwrap_err();
        assert!(matches!(err, HeaderError::FieldTooLarge { field: "key id", .. }));
    }

    #[test]
    fn tight_limits_reject_large_context() {
        let wire = encode_header(&tagged(Algorithm::Aes256GcmNoPadding, &[3u8; 32])).unwrap();
        let limits = HeaderLimits { max_context_entries: 1, ..HeaderLimits::default() };
        let err = decode_header(&wire, &limits).unwrap_err();
        assert!(matches!(err, HeaderError::TooManyContextEntries { count: 2, max: 1 }));
    }

    #[test]
    fn non_canonical_context_rejected() {
        // Hand-built header with context keys out of order.
        let mut wire = Vec::new();
        wire.extend_from_slice(&MAGIC_AEH1);
        wire.extend_from_slice(&1u32.to_be_bytes());
        wire.extend_from_slice(&1u16.to_be_bytes());
        wire.extend_from_slice(&0u32.to_be_bytes());
        wire.extend_from_slice(&2u32.to_be_bytes());
        for s in ["b", "1", "a", "2"] {
            wire.extend_from_slice(&(s.len() as u32).to_be_bytes());
            wire.extend_from_slice(s.as_bytes());
        }
        wire.extend_from_slice(&12u32.to_be_bytes());
        wire.extend_from_slice(&[0u8; 12]);
        wire.extend_from_slice(&16u32.to_be_bytes());
        wire.extend_from_slice(&[0u8; 16]);
        let err = decode_header(&wire, &HeaderLimits::default()).unwrap_err();
        assert!(matches!(err, HeaderError::NonCanonicalContext { ref key } if key == "a"));
    }

// ## 4️⃣ Header tag

    #[test]
    fn tag_and_iv_set_once() {
        let key = [5u8; 32];
        let mut h = tagged(Algorithm::ChaCha20Poly1305, &key);
        assert_eq!(h.header_iv.len(), 12);
        assert_eq!(h.header_auth_tag.len(), 16);
        let p = AlgorithmHandler::new(Algorithm::ChaCha20Poly1305, &key).unwrap();
        assert!(matches!(compute_header_tag(&mut h, &p), Err(CryptoError::State(_))));
    }

    #[test]
    fn cbc_header_uses_block_sized_iv() {
        let h = tagged(Algorithm::Sm4CbcPkcs7, &[2u8; 16]);
        assert_eq!(h.header_iv.len(), 16);
        assert_eq!(h.header_auth_tag.len(), 16);
    }

    #[test]
    fn verify_accepts_untouched_header_for_every_algorithm() {
        for alg in Algorithm::ALL {
            let key = vec![0x11u8; alg.key_len()];
            let h = tagged(alg, &key);
            let p = AlgorithmHandler::new(alg, &key).unwrap();
            assert!(verify_header_tag(&h, &p), "{alg}");
            assert!(check_header_tag(&h, &p).is_valid());
        }
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let h = tagged(Algorithm::Aes128GcmNoPadding, &[1u8; 16]);
        let p = AlgorithmHandler::new(Algorithm::Aes128GcmNoPadding, &[2u8; 16]).unwrap();
        assert!(matches!(check_header_tag(&h, &p), HeaderTagCheck::Mismatch));
        assert!(!verify_header_tag(&h, &p));
    }

    #[test]
    fn verify_rejects_tampered_fields() {
        let key = [4u8; 32];
        let base = tagged(Algorithm::Aes256GcmNoPadding, &key);
        let p = AlgorithmHandler::new(Algorithm::Aes256GcmNoPadding, &key).unwrap();

        let mut h = base.clone();
        h.version ^= 1;
        assert!(!verify_header_tag(&h, &p), "version");

        let mut h = base.clone();
        h.encrypted_data_keys[0].data_key[0] ^= 0x01;
        assert!(!verify_header_tag(&h, &p), "data key");

        let mut h = base.clone();
        h.encrypted_data_keys[1].key_id.push('x');
        assert!(!verify_header_tag(&h, &p), "key id");

        let mut h = base.clone();
        h.encryption_context.insert("tenant", "evil");
        assert!(!verify_header_tag(&h, &p), "context");

        let mut h = base.clone();
        h.header_auth_tag[15] ^= 0x01;
        assert!(!verify_header_tag(&h, &p), "tag");

        let mut h = base.clone();
        h.header_iv[0] ^= 0x01;
        assert!(!verify_header_tag(&h, &p), "iv");
    }

    #[test]
    fn algorithm_swap_is_a_fault_and_fails_closed() {
        let key = [4u8; 32];
        let mut h = tagged(Algorithm::Aes256GcmNoPadding, &key);
        h.algorithm = Algorithm::ChaCha20Poly1305;
        let p = AlgorithmHandler::new(Algorithm::Aes256GcmNoPadding, &key).unwrap();
        assert!(matches!(
            check_header_tag(&h, &p),
            HeaderTagCheck::Fault(CryptoError::AlgorithmMismatch { .. })
        ));
        assert!(!verify_header_tag(&h, &p));
    }

    #[test]
    fn malformed_iv_is_a_fault_and_fails_closed() {
        let key = [4u8; 16];
        let mut h = tagged(Algorithm::Aes128GcmNoPadding, &key);
        h.header_iv.truncate(5);
        let p = AlgorithmHandler::new(Algorithm::Aes128GcmNoPadding, &key).unwrap();
        assert!(matches!(check_header_tag(&h, &p), HeaderTagCheck::Fault(CryptoError::InvalidIvLen { .. })));
        assert!(!verify_header_tag(&h, &p));
    }

    #[test]
    fn missing_tag_is_a_mismatch() {
        let key = [4u8; 16];
        let mut h = tagged(Algorithm::Aes128GcmNoPadding, &key);
        h.header_auth_tag.clear();
        let p = AlgorithmHandler::new(Algorithm::Aes128GcmNoPadding, &key).unwrap();
        assert!(matches!(check_header_tag(&h, &p), HeaderTagCheck::Mismatch));
    }

    #[test]
    fn header_ivs_are_fresh_per_compute() {
        let a = tagged(Algorithm::Aes128GcmNoPadding, &[1u8; 16]);
        let b = tagged(Algorithm::Aes128GcmNoPadding, &[1u8; 16]);
        assert_ne!(a.header_iv, b.header_iv);
        assert_ne!(a.header_auth_tag, b.header_auth_tag);
    }

    #[test]
    fn data_key_debug_is_redacted() {
        let k = EncryptedDataKey::new("id", vec![0xDE, 0xAD]);
        let s = format!("{:?}", k);
        assert!(s.contains("data_key_len: 2"));
        assert!(!s.contains("222"));
    }
}
