//! stream/chunked.rs
//! Pumps a source through a `StreamingCipher` in fixed-size chunks.
//!
//! Design notes:
//! - Memory is bounded by `chunk_size` plus whatever the cipher withholds
//!   (one tag or one block on open).
//! - On open, bytes written before `finalize` are unauthenticated until
//!   `pump` returns `Ok`.

use std::io::{Read, Write};
use std::time::Instant;
use tracing::trace;

use crate::crypto::{Direction, StreamingCipher};
use crate::stream::io::read_exact_or_eof;
use crate::telemetry::{Stage, TelemetryCounters, TelemetryTimer};
use crate::types::EnvelopeError;

pub struct ChunkedCipherStream {
    cipher: Box<dyn StreamingCipher>,
    direction: Direction,
    chunk_size: usize,
    /// Trailing tag bytes emitted by `finalize` on seal (0 for CBC).
    tag_len: usize,
}

impl ChunkedCipherStream {
    pub fn new(cipher: Box<dyn StreamingCipher>, direction: Direction, chunk_size: usize, tag_len: usize) -> Self {
        Self { cipher, direction, chunk_size: chunk_size.max(1), tag_len }
    }

    /// Feed associated data before the first chunk.
    pub fn update_aad(&mut self, aad: &[u8]) -> Result<(), EnvelopeError> {
        self.cipher.update_aad(aad)?;
        Ok(())
    }

    fn crypt_stage(&self) -> Stage {
        match self.direction {
            Direction::Seal => Stage::Encrypt,
            Direction::Open => Stage::Decrypt,
        }
    }

    /// Read until EOF, transform, write, then emit the finalize output and flush.
    pub fn pump<R, W>(
        mut self,
        reader: &mut R,
        writer: &mut W,
        counters: &mut TelemetryCounters,
        timer: &mut TelemetryTimer,
    ) -> Result<(), EnvelopeError>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let stage = self.crypt_stage();
        loop {
            let t = Instant::now();
            let chunk = read_exact_or_eof(reader, self.chunk_size)?;
            timer.add_stage_time(Stage::Read, t.elapsed());
            if chunk.is_empty() {
                break;
            }

            let t = Instant::now();
            let out = self.cipher.update(&chunk)?;
            timer.add_stage_time(stage, t.elapsed());

            let t = Instant::now();
            writer.write_all(&out)?;
            timer.add_stage_time(Stage::Write, t.elapsed());

            counters.add_chunk(chunk.len(), out.len());
            trace!(chunk = counters.chunks, in_len = chunk.len(), out_len = out.len(), "chunk processed");

            if chunk.len() < self.chunk_size {
                break;
            }
        }

        let t = Instant::now();
        let tail = self.cipher.finalize()?;
        timer.add_stage_time(stage, t.elapsed());

        let t = Instant::now();
        writer.write_all(&tail)?;
        writer.flush()?;
        timer.add_stage_time(Stage::Write, t.elapsed());

        counters.add_final(tail.len(), self.direction == Direction::Seal && self.tag_len > 0);
        Ok(())
    }
}
