pub mod types;
pub mod algorithm;
pub mod aead;
pub mod stream;
pub mod nonce;

pub use types::*;
pub use algorithm::*;
pub use aead::*;
pub use stream::*;
pub use nonce::*;
