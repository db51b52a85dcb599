use std::io;
use thiserror::Error;

/// Body framing errors: the length-prefixed IV and the chunk stream.
#[derive(Debug, Error)]
pub enum FrameError {
    /// IV length prefix disagrees with the algorithm.
    #[error("IV length mismatch: expected={expected}, actual={actual}")]
    IvLenMismatch { expected: usize, actual: usize },

    /// Stream ended inside a frame field.
    #[error("truncated {field}: have={have}, need={need}")]
    Truncated { field: &'static str, have: usize, need: usize },

    /// Input bytes remained after a complete envelope.
    #[error("{extra} trailing bytes after envelope")]
    TrailingBytes { extra: usize },

    /// Source or sink failure.
    #[error("frame I/O: {0}")]
    Io(#[from] io::Error),
}
