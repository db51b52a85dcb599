//! envelope-core
//!
//! Envelope encryption engine: a per-message data key seals a payload and
//! authenticates a cleartext header (wrapped data keys, algorithm,
//! encryption context) with an AEAD tag over an empty payload.
//! Buffered and streaming modes share one header protocol.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod config;
pub mod types;
pub mod utils;

pub mod crypto;
pub mod headers;
pub mod envelope;
pub mod telemetry;

// Body stream layer
pub mod stream;

pub mod engine;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::crypto::{AeadPrimitive, Algorithm, AlgorithmHandler, Direction, StreamingCipher};
    pub use crate::engine::{EnvelopeEngine, StreamSummary};
    pub use crate::envelope::{BodyPayload, DecryptionMaterial, EncryptionMaterial, Envelope, EnvelopeBody};
    pub use crate::headers::{EncryptedDataKey, EncryptionContext, EnvelopeHeader};
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::EnvelopeError;
}
