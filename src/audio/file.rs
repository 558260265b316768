//! File-backed frame source
//!
//! Decodes a WAV file to the fixed recognizer layout (16 kHz mono S16LE)
//! up front and then hands it out chunk by chunk.

use hound::{SampleFormat, WavReader};
use rubato::{FftFixedIn, Resampler};
use std::path::Path;
use tracing::{debug, info};

use crate::audio::{AudioChunk, FrameSource, SAMPLE_RATE};
use crate::error::AudioError;

/// Frame source over a decoded audio file
pub struct FileFrameSource {
    pcm: Vec<u8>,
    pos: usize,
    chunk_size: usize,
}

impl FileFrameSource {
    /// Open and decode an audio file, converting to the recognizer layout.
    ///
    /// Fails with `NotFound` for a missing path and `UnsupportedFormat` when
    /// the container cannot be decoded.
    pub fn open<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self, AudioError> {
        let path = path.as_ref();
        let mut reader = WavReader::open(path).map_err(|e| match e {
            hound::Error::IoError(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                AudioError::NotFound(path.display().to_string())
            }
            other => AudioError::UnsupportedFormat(other.to_string()),
        })?;

        let spec = reader.spec();
        info!(
            "WAV format: {} channels, {} Hz, {} bits",
            spec.channels, spec.sample_rate, spec.bits_per_sample
        );

        let samples: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader.samples::<f32>().filter_map(|s| s.ok()).collect(),
            SampleFormat::Int => {
                let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .filter_map(|s| s.ok())
                    .map(|s| s as f32 / max_val)
                    .collect()
            }
        };

        // Convert to mono if multi-channel
        let mono: Vec<f32> = if spec.channels > 1 {
            samples
                .chunks(spec.channels as usize)
                .map(|frame| frame.iter().sum::<f32>() / spec.channels as f32)
                .collect()
        } else {
            samples
        };

        let resampled = if spec.sample_rate != SAMPLE_RATE {
            resample(&mono, spec.sample_rate, SAMPLE_RATE)?
        } else {
            mono
        };

        let mut pcm = Vec::with_capacity(resampled.len() * 2);
        for sample in resampled {
            let s = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            pcm.extend_from_slice(&s.to_le_bytes());
        }

        debug!(
            "Decoded {} bytes of PCM ({:.2}s)",
            pcm.len(),
            pcm.len() as f32 / (SAMPLE_RATE as f32 * 2.0)
        );

        Ok(Self {
            pcm,
            pos: 0,
            chunk_size,
        })
    }
}

impl FrameSource for FileFrameSource {
    fn next_chunk(&mut self) -> Result<Option<AudioChunk>, AudioError> {
        if self.pos >= self.pcm.len() {
            return Ok(None);
        }

        let end = (self.pos + self.chunk_size).min(self.pcm.len());
        let chunk = self.pcm[self.pos..end].to_vec();
        self.pos = end;
        Ok(Some(AudioChunk::from_bytes(chunk)))
    }
}

fn resample(input: &[f32], from: u32, to: u32) -> Result<Vec<f32>, AudioError> {
    debug!("Resampling: {} Hz -> {} Hz", from, to);

    let mut resampler = FftFixedIn::<f32>::new(
        from as usize,
        to as usize,
        1024, // chunk size
        1,    // sub-chunks
        1,    // channels
    )
    .map_err(|e| AudioError::Decode(e.to_string()))?;

    let delay = resampler.output_delay();
    let expected = (input.len() as f64 * to as f64 / from as f64).round() as usize;

    let mut output = Vec::new();
    let mut pos = 0;
    while pos < input.len() {
        let need = resampler.input_frames_next();
        let mut frame = vec![0.0f32; need];
        let n = need.min(input.len() - pos);
        frame[..n].copy_from_slice(&input[pos..pos + n]);
        pos += n;

        let processed = resampler
            .process(&[frame], None)
            .map_err(|e| AudioError::Decode(e.to_string()))?;
        output.extend_from_slice(&processed[0]);
    }

    // The FFT stages sit on `delay` frames of latency; keep feeding silence
    // until the real tail has come through, then cut the output to the
    // delay-compensated window.
    while output.len() < delay + expected {
        let need = resampler.input_frames_next();
        let processed = resampler
            .process(&[vec![0.0f32; need]], None)
            .map_err(|e| AudioError::Decode(e.to_string()))?;
        output.extend_from_slice(&processed[0]);
    }

    output.drain(..delay);
    output.truncate(expected);
    Ok(output)
}
