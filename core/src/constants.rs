// ## 📂 File: `src/constants.rs`

//! Protocol constants shared by headers, crypto and the stream layer.

/// Magic marker for the serialized envelope header.
/// "AEH1" = Authenticated Envelope Header v1
pub const MAGIC_AEH1: [u8; 4] = *b"AEH1";

/// Default envelope format version written into new headers.
pub const FORMAT_VERSION_V1: u32 = 1;

/// Chunk size used by the streaming path when the config does not override it.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;
/// Max chunk size sanity bound (32 MiB).
pub const MAX_CHUNK_SIZE: usize = 32 * 1024 * 1024;

/// Width of every length prefix on the wire (big-endian u32).
pub const LEN_PREFIX: usize = 4;

/// Header tags are always full-width GCM / Poly1305 tags.
pub const HEADER_TAG_LEN: usize = 16;

/// Decoder sanity bounds (overridable through `EngineConfig`).
pub const DEFAULT_MAX_FIELD_LEN: usize = 64 * 1024;
pub const DEFAULT_MAX_DATA_KEYS: usize = 64;
pub const DEFAULT_MAX_CONTEXT_ENTRIES: usize = 256;

/// Algorithm identifiers (mirrored in `crypto::algorithm`).
pub mod algorithm_ids {
    pub const AES128_GCM: u16        = 0x0001;
    pub const AES256_GCM: u16        = 0x0002;
    pub const AES128_CBC_PKCS7: u16  = 0x0003;
    pub const AES256_CBC_PKCS7: u16  = 0x0004;
    pub const SM4_GCM: u16           = 0x0005;
    pub const SM4_CBC_PKCS7: u16     = 0x0006;
    pub const CHACHA20_POLY1305: u16 = 0x0007;
}
