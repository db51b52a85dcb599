//! stream/io.rs
//! Where envelope bytes come from and go to, plus the body IV frame.

use std::io::{self, Cursor, ErrorKind, Read, Write};
use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use byteorder::{BigEndian, ByteOrder};

use crate::constants::LEN_PREFIX;
use crate::stream::types::FrameError;
use crate::types::EnvelopeError;

/// Plaintext (seal) or envelope (open) source.
pub enum InputSource {
    Reader(Box<dyn Read + Send>),
    File(PathBuf),
    Memory(Vec<u8>),
}

/// Envelope (seal) or plaintext (open) destination.
pub enum OutputSink {
    Writer(Box<dyn Write + Send>),
    File(PathBuf),
    Memory,
}

/// Turn any source into one boxed reader.
pub fn open_input(src: InputSource) -> Result<Box<dyn Read + Send>, EnvelopeError> {
    let boxed: Box<dyn Read + Send> = match src {
        InputSource::Reader(reader) => reader,
        InputSource::File(path) => Box::new(File::open(path)?),
        InputSource::Memory(bytes) => Box::new(Cursor::new(bytes)),
    };
    Ok(boxed)
}

/// Turn any sink into one boxed writer.
///
/// `OutputSink::Memory` also returns the shared buffer so the caller can
/// read back what was written.
pub fn open_output(
    sink: OutputSink,
) -> Result<(Box<dyn Write + Send>, Option<Arc<Mutex<Vec<u8>>>>), EnvelopeError> {
    match sink {
        OutputSink::Writer(writer) => Ok((writer, None)),
        OutputSink::File(path) => Ok((Box::new(File::create(path)?), None)),
        OutputSink::Memory => {
            let buf = Arc::new(Mutex::new(Vec::new()));
            Ok((Box::new(SharedBufferWriter::new(Arc::clone(&buf))), Some(buf)))
        }
    }
}

pub struct SharedBufferWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl SharedBufferWriter {
    pub fn new(buf: Arc<Mutex<Vec<u8>>>) -> Self {
        Self { buf }
    }
}

impl Write for SharedBufferWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .map_err(|_| io::Error::new(ErrorKind::Other, "shared buffer poisoned"))?
            .extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ================= Chunk reads =================

/// Read up to `len` bytes, stopping early only at EOF.
/// A short (or empty) result means the source is exhausted.
pub fn read_exact_or_eof<R: Read + ?Sized>(
    r: &mut R,
    len: usize,
) -> Result<Bytes, FrameError> {
    let mut chunk = vec![0u8; len];
    let mut off = 0;

    while off < len {
        match r.read(&mut chunk[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(FrameError::Io(e)),
        }
    }

    chunk.truncate(off);
    Ok(Bytes::from(chunk))
}

fn read_field<R: Read + ?Sized>(r: &mut R, len: usize, field: &'static str) -> Result<Bytes, FrameError> {
    let got = read_exact_or_eof(r, len)?;
    if got.len() < len {
        return Err(FrameError::Truncated { field, have: got.len(), need: len });
    }
    Ok(got)
}

// ================= Body IV framing =================

/// Write `u32 BE len ‖ iv` and flush. Returns the framed length.
pub fn write_iv<W: Write + ?Sized>(w: &mut W, iv: &[u8]) -> Result<usize, FrameError> {
    let mut prefix = [0u8; LEN_PREFIX];
    BigEndian::write_u32(&mut prefix, iv.len() as u32);
    w.write_all(&prefix)?;
    w.write_all(iv)?;
    w.flush()?;
    Ok(LEN_PREFIX + iv.len())
}

/// Read a length-prefixed IV and check it against `expected_len`.
///
/// The length is validated before the IV bytes are read, so a corrupted
/// prefix never drives an allocation.
pub fn read_iv<R: Read + ?Sized>(r: &mut R, expected_len: usize) -> Result<Vec<u8>, FrameError> {
    let prefix = read_field(r, LEN_PREFIX, "IV length")?;
    let len = BigEndian::read_u32(&prefix) as usize;
    if len != expected_len {
        return Err(FrameError::IvLenMismatch { expected: expected_len, actual: len });
    }
    Ok(read_field(r, len, "IV")?.to_vec())
}
