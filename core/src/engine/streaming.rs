//! engine/streaming.rs
//! Streaming seal and open.
//!
//! Wire: `header ‖ u32 BE ivLen ‖ iv ‖ ciphertext chunks ‖ tag`.
//! On open, plaintext is written as it is produced. If the call fails,
//! whatever reached the sink is unauthenticated and must be discarded.

use std::io::{Read, Write};
use std::time::Instant;
use tracing::{debug, warn};

use crate::constants::LEN_PREFIX;
use crate::crypto::{random_iv, AeadPrimitive, AlgorithmHandler, Direction};
use crate::engine::{authenticate_header, body_aad, check_required_context, EnvelopeEngine};
use crate::envelope::{DecryptionMaterial, EncryptionMaterial, Envelope, EnvelopeBody};
use crate::headers::{encode_header, encoded_len, read_header, EnvelopeHeader};
use crate::stream::{read_iv, write_iv, ChunkedCipherStream};
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::EnvelopeError;

/// Result of a streaming seal: the envelope (body payload `Streamed`) and
/// what it cost.
#[derive(Debug, Clone)]
pub struct StreamSummary {
    pub envelope: Envelope,
    pub telemetry: TelemetrySnapshot,
}

impl EnvelopeEngine {
    pub fn encrypt_stream<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        material: &EncryptionMaterial,
    ) -> Result<StreamSummary, EnvelopeError>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let primitive = AlgorithmHandler::new(material.algorithm, &material.plaintext_data_key)?;
        self.encrypt_stream_with(&primitive, reader, writer, material)
    }

    pub fn encrypt_stream_with<R, W>(
        &self,
        primitive: &dyn AeadPrimitive,
        reader: &mut R,
        writer: &mut W,
        material: &EncryptionMaterial,
    ) -> Result<StreamSummary, EnvelopeError>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut timer = TelemetryTimer::new();
        let mut counters = TelemetryCounters::default();

        let t = Instant::now();
        let header = self.build_header(material, primitive)?;
        let wire = encode_header(&header)?;
        timer.add_stage_time(Stage::Header, t.elapsed());

        let t = Instant::now();
        writer.write_all(&wire)?;
        counters.add_header(wire.len());

        let algorithm = header.algorithm;
        let iv = random_iv(algorithm.iv_len())?;
        let framed = write_iv(writer, &iv)?;
        counters.add_iv_frame(framed);
        timer.add_stage_time(Stage::Write, t.elapsed());

        let cipher = primitive.start(&iv, Direction::Seal)?;
        let mut stream = ChunkedCipherStream::new(cipher, Direction::Seal, self.config.chunk_size, algorithm.tag_len());
        if let Some(aad) = body_aad(&header) {
            stream.update_aad(&aad)?;
        }
        stream.pump(reader, writer, &mut counters, &mut timer)?;

        timer.finish();
        let telemetry = TelemetrySnapshot::from(&counters, &timer);
        debug!(
            %algorithm,
            chunks = telemetry.chunks,
            bytes_in = telemetry.bytes_in,
            bytes_out = telemetry.bytes_out,
            "sealed stream"
        );

        Ok(StreamSummary {
            envelope: Envelope::new(header, EnvelopeBody::streamed(iv)),
            telemetry,
        })
    }

    /// Consume and parse the header at the front of a sealed stream.
    ///
    /// The header is not authenticated yet; the caller uses its data keys
    /// to recover the plaintext key, then calls `decrypt_stream`.
    pub fn read_stream_header<R>(&self, reader: &mut R) -> Result<EnvelopeHeader, EnvelopeError>
    where
        R: Read + ?Sized,
    {
        let (header, used) = read_header(reader, &self.config.header_limits())?;
        debug!(algorithm = %header.algorithm, header_len = used, "read stream header");
        Ok(header)
    }

    pub fn decrypt_stream<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        header: &EnvelopeHeader,
        material: &DecryptionMaterial,
    ) -> Result<TelemetrySnapshot, EnvelopeError>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let primitive = AlgorithmHandler::new(material.algorithm, &material.plaintext_data_key)?;
        self.decrypt_stream_with(&primitive, reader, writer, header, material)
    }

    pub fn decrypt_stream_with<R, W>(
        &self,
        primitive: &dyn AeadPrimitive,
        reader: &mut R,
        writer: &mut W,
        header: &EnvelopeHeader,
        material: &DecryptionMaterial,
    ) -> Result<TelemetrySnapshot, EnvelopeError>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut timer = TelemetryTimer::new();
        let mut counters = TelemetryCounters::default();

        let t = Instant::now();
        authenticate_header(header, primitive)?;
        check_required_context(header, material)?;
        timer.add_stage_time(Stage::Header, t.elapsed());
        counters.add_header(encoded_len(header));

        let algorithm = header.algorithm;
        let t = Instant::now();
        let iv = read_iv(reader, algorithm.iv_len())?;
        timer.add_stage_time(Stage::Read, t.elapsed());
        counters.add_iv_frame(LEN_PREFIX + iv.len());

        let cipher = primitive.start(&iv, Direction::Open)?;
        let mut stream = ChunkedCipherStream::new(cipher, Direction::Open, self.config.chunk_size, algorithm.tag_len());
        if let Some(aad) = body_aad(header) {
            stream.update_aad(&aad)?;
        }
        if let Err(err) = stream.pump(reader, writer, &mut counters, &mut timer) {
            if err.is_integrity_failure() {
                warn!(%algorithm, "stream authentication failed; emitted output is unauthenticated");
            }
            return Err(err);
        }

        timer.finish();
        let telemetry = TelemetrySnapshot::from(&counters, &timer);
        debug!(%algorithm, chunks = telemetry.chunks, bytes_out = telemetry.bytes_out, "opened stream");
        Ok(telemetry)
    }
}
