// ## src/headers/mod.rs

//! headers/mod.rs
//! Envelope header: authenticated metadata, wire codec and header tag.
//!
//! Notes:
//! - Cleartext fields are authenticated, never encrypted.
//! - All multi-byte integers are big-endian; every variable field is u32 length-prefixed.
//! - The header tag is an AEAD tag over an empty payload, keyed by the data key,
//!   with the serialized authenticated fields as AAD.

pub mod types;
pub mod context;
pub mod encode;
pub mod decode;
pub mod auth;

pub use types::*;
pub use context::*;
pub use encode::*;
pub use decode::*;
pub use auth::*;
