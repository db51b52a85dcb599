// ### `src/telemetry/counters.rs`

//! telemetry/counters.rs
//! Mutable counters used while sealing or opening one envelope.
//!
//! Summary: Collects chunk counts and byte counts during encrypt/decrypt.
//! Converted into an immutable TelemetrySnapshot when the call returns.
use std::ops::AddAssign;
use serde::{Serialize, Deserialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    /// Chunks pushed through the streaming cipher.
    pub chunks: u64,
    /// Bytes consumed from the input (plaintext on seal, ciphertext on open).
    pub bytes_in: u64,
    /// Bytes emitted by the cipher (ciphertext on seal, plaintext on open).
    pub bytes_out: u64,
    /// Header wire, IV framing and tag bytes.
    pub bytes_overhead: u64,
}

impl TelemetryCounters {
    /// Record the serialized header as overhead.
    pub fn add_header(&mut self, header_len: usize) {
        self.bytes_overhead += header_len as u64;
    }

    /// Record the length-prefixed body IV as overhead.
    pub fn add_iv_frame(&mut self, frame_len: usize) {
        self.bytes_overhead += frame_len as u64;
    }

    /// Record one chunk: `in_len` bytes read, `out_len` bytes produced.
    pub fn add_chunk(&mut self, in_len: usize, out_len: usize) {
        self.chunks += 1;
        self.bytes_in += in_len as u64;
        self.bytes_out += out_len as u64;
    }

    /// Record bytes emitted by `finalize` (tag on seal, last block on open).
    pub fn add_final(&mut self, out_len: usize, is_tag: bool) {
        if is_tag {
            self.bytes_overhead += out_len as u64;
        } else {
            self.bytes_out += out_len as u64;
        }
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.chunks += other.chunks;
        self.bytes_in += other.bytes_in;
        self.bytes_out += other.bytes_out;
        self.bytes_overhead += other.bytes_overhead;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
