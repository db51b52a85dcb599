//! envelope/mod.rs
//! Envelope transfer objects, key materials and the buffered wire codec.

pub mod types;
pub mod material;
pub mod codec;

pub use types::*;
pub use material::*;
pub use codec::*;
