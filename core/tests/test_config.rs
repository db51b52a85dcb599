#[cfg(test)]
mod tests {
    use envelope_core::config::EngineConfig;
    use envelope_core::constants::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
    use envelope_core::engine::EnvelopeEngine;
    use envelope_core::types::EnvelopeError;

    #[test]
    fn defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(c.chunk_size, 4096);
        c.validate().unwrap();
        assert_eq!(c.header_limits().max_data_keys, c.max_data_keys);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let c = EngineConfig::from_json_str(r#"{ "chunk_size": 1024 }"#).unwrap();
        assert_eq!(c.chunk_size, 1024);
        assert_eq!(c.max_field_len, EngineConfig::default().max_field_len);
    }

    #[test]
    fn json_roundtrip() {
        let c = EngineConfig::default().with_chunk_size(65536);
        let s = c.to_json_string().unwrap();
        assert!(s.contains("\"chunk_size\": 65536"));
        assert_eq!(EngineConfig::from_json_str(&s).unwrap(), c);
    }

    #[test]
    fn invalid_values_rejected() {
        for bad in [
            r#"{ "chunk_size": 0 }"#.to_string(),
            format!(r#"{{ "chunk_size": {} }}"#, MAX_CHUNK_SIZE + 1),
            r#"{ "max_data_keys": 0 }"#.to_string(),
            r#"{ "chunk_size": "big" }"#.to_string(),
            "not json".to_string(),
        ] {
            let err = EngineConfig::from_json_str(&bad).unwrap_err();
            assert!(matches!(err, EnvelopeError::Validation(_)), "{bad}");
        }
    }

    #[test]
    fn engine_refuses_invalid_config() {
        let err = EnvelopeEngine::new(EngineConfig::default().with_chunk_size(0)).unwrap_err();
        assert!(matches!(err, EnvelopeError::Validation(_)));
        let engine = EnvelopeEngine::new(EngineConfig::default().with_chunk_size(16)).unwrap();
        assert_eq!(engine.config().chunk_size, 16);
    }
}
