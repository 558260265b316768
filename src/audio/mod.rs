//! Audio sources: live capture and file decode

pub mod capture;
pub mod file;

use crate::error::AudioError;

pub use capture::{MicCapture, MicFrameSource};
pub use file::FileFrameSource;

/// Sample rate required by the recognition engine (Hz)
pub const SAMPLE_RATE: u32 = 16_000;
/// Bits per sample (signed, little-endian)
pub const SAMPLE_BITS: u16 = 16;
/// Channel count (mono)
pub const CHANNELS: u16 = 1;
/// Bytes per sample frame
pub const BYTES_PER_SAMPLE: usize = (SAMPLE_BITS / 8) as usize;
/// Default chunk size in bytes handed to the recognizer per iteration
pub const CHUNK_SIZE: usize = 4096;

/// A fixed-capacity buffer of raw PCM bytes (mono, 16-bit signed, 16 kHz, LE).
///
/// The trailing chunk of a stream may be shorter than the configured
/// capacity, including an odd byte count when the stream is truncated
/// mid-sample.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    buf: Vec<u8>,
}

impl AudioChunk {
    pub fn from_bytes(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// A lazy sequence of fixed-size PCM chunks.
///
/// `next_chunk` blocks until data is available (live mode) and returns
/// `Ok(None)` when the underlying stream or device is exhausted.
pub trait FrameSource: Send {
    fn next_chunk(&mut self) -> Result<Option<AudioChunk>, AudioError>;
}
