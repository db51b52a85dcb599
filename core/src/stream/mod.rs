//! stream/mod.rs
//! Streaming body I/O: IV framing, normalized sources/sinks and the
//! chunk pump that drives a `StreamingCipher`.

pub mod types;
pub mod io;
pub mod chunked;

pub use types::*;
pub use io::*;
pub use chunked::*;
