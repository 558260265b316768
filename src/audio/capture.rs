//! Live audio capture using cpal
//!
//! Capture is split in two: [`MicCapture`] owns the cpal device and stream
//! and must stay on the thread that opened it (cpal streams are not `Send`),
//! while [`MicFrameSource`] is the `Send` half handed to the capture worker.
//! Closing the capture drops every channel sender, which makes a blocked
//! `next_chunk` return end-of-stream promptly. This is the fast-cancellation
//! path for a live session.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SampleFormat, SampleRate, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::audio::{AudioChunk, FrameSource, CHANNELS, SAMPLE_RATE};
use crate::config::AudioConfig;
use crate::error::AudioError;

/// Live microphone capture handle (owner side, not `Send`)
pub struct MicCapture {
    config: AudioConfig,
    host: Host,
    device: Option<Device>,
    stream: Option<Stream>,
    sender: Option<Sender<Vec<u8>>>,
    receiver: Receiver<Vec<u8>>,
    input_channels: u16,
    sample_format: SampleFormat,
}

impl MicCapture {
    pub fn new(config: AudioConfig) -> Self {
        let host = cpal::default_host();
        let (sender, receiver) = bounded(100); // buffer up to 100 callbacks

        Self {
            config,
            host,
            device: None,
            stream: None,
            sender: Some(sender),
            receiver,
            input_channels: CHANNELS,
            sample_format: SampleFormat::F32,
        }
    }

    /// List available audio input devices
    pub fn list_devices(&self) -> Result<Vec<String>, AudioError> {
        let devices = self
            .host
            .input_devices()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Open the capture device and negotiate the 16 kHz input format.
    ///
    /// Fails with `DeviceUnavailable` when no device can be opened and with
    /// `UnsupportedFormat` when no input configuration covers 16 kHz.
    pub fn open(&mut self) -> Result<(), AudioError> {
        let device = if let Some(ref device_name) = self.config.device {
            self.find_device_by_name(device_name)?
        } else {
            self.host
                .default_input_device()
                .ok_or(AudioError::NoInputDevice)?
        };

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using audio input device: {}", device_name);

        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

        let target_rate = SampleRate(SAMPLE_RATE);
        let mut best_config = None;
        for cfg in supported_configs {
            debug!(
                "Supported config: channels={}, sample_rate={:?}-{:?}, format={:?}",
                cfg.channels(),
                cfg.min_sample_rate(),
                cfg.max_sample_rate(),
                cfg.sample_format()
            );

            if cfg.min_sample_rate() > target_rate || target_rate > cfg.max_sample_rate() {
                continue;
            }
            if !matches!(cfg.sample_format(), SampleFormat::F32 | SampleFormat::I16) {
                continue;
            }

            // Prefer native mono; fall back to downmixing a multi-channel input
            if cfg.channels() == CHANNELS {
                best_config = Some(cfg.with_sample_rate(target_rate));
                break;
            }
            if best_config.is_none() {
                best_config = Some(cfg.with_sample_rate(target_rate));
            }
        }

        let supported_config = best_config.ok_or_else(|| {
            AudioError::UnsupportedFormat(format!(
                "device does not support {} Hz capture",
                SAMPLE_RATE
            ))
        })?;

        self.input_channels = supported_config.channels();
        self.sample_format = supported_config.sample_format();
        info!(
            "Audio config: {} channels @ {} Hz ({:?})",
            self.input_channels,
            SAMPLE_RATE,
            self.sample_format
        );

        self.device = Some(device);
        Ok(())
    }

    /// Create the `Send` chunk source backed by this capture
    pub fn frame_source(&self) -> MicFrameSource {
        MicFrameSource {
            receiver: self.receiver.clone(),
            pending: Vec::new(),
            chunk_size: self.config.chunk_size,
        }
    }

    /// Start streaming samples into the frame source
    pub fn start(&mut self) -> Result<(), AudioError> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| AudioError::DeviceUnavailable("device not opened".to_string()))?;

        let stream_config = StreamConfig {
            channels: self.input_channels,
            sample_rate: SampleRate(SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        };

        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| AudioError::DeviceUnavailable("capture already closed".to_string()))?
            .clone();
        let channels = self.input_channels as usize;
        let err_fn = |err| error!("Audio stream error: {}", err);

        let stream = match self.sample_format {
            SampleFormat::F32 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        forward(&sender, downmix_f32(data, channels));
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?,
            SampleFormat::I16 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        forward(&sender, downmix_i16(data, channels));
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?,
            other => {
                return Err(AudioError::UnsupportedFormat(format!(
                    "unsupported sample format: {:?}",
                    other
                )))
            }
        };

        stream
            .play()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

        self.stream = Some(stream);
        info!("Audio capture started");
        Ok(())
    }

    /// Close the device and disconnect the frame source.
    ///
    /// After this call the frame source drains any buffered audio and then
    /// reports end-of-stream. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            info!("Audio capture stopped");
        }
        self.sender = None;
    }

    fn find_device_by_name(&self, name: &str) -> Result<Device, AudioError> {
        let devices = self
            .host
            .input_devices()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

        for device in devices {
            if let Ok(device_name) = device.name() {
                if device_name.contains(name) {
                    return Ok(device);
                }
            }
        }

        Err(AudioError::DeviceNotFound(name.to_string()))
    }
}

impl Drop for MicCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

fn downmix_f32(data: &[f32], channels: usize) -> Vec<i16> {
    let to_i16 = |s: f32| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
    if channels > 1 {
        data.chunks(channels)
            .map(|frame| to_i16(frame.iter().sum::<f32>() / channels as f32))
            .collect()
    } else {
        data.iter().copied().map(to_i16).collect()
    }
}

fn downmix_i16(data: &[i16], channels: usize) -> Vec<i16> {
    if channels > 1 {
        data.chunks(channels)
            .map(|frame| (frame.iter().map(|&s| s as i32).sum::<i32>() / channels as i32) as i16)
            .collect()
    } else {
        data.to_vec()
    }
}

fn forward(sender: &Sender<Vec<u8>>, samples: Vec<i16>) {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    if sender.try_send(bytes).is_err() {
        warn!("Audio buffer overflow - dropping samples");
    }
}

/// Chunked view over the capture channel (worker side, `Send`)
pub struct MicFrameSource {
    receiver: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    chunk_size: usize,
}

impl FrameSource for MicFrameSource {
    fn next_chunk(&mut self) -> Result<Option<AudioChunk>, AudioError> {
        while self.pending.len() < self.chunk_size {
            match self.receiver.recv() {
                Ok(bytes) => self.pending.extend_from_slice(&bytes),
                // Device closed: hand out whatever is left as short chunks
                Err(_) => break,
            }
        }

        if self.pending.is_empty() {
            return Ok(None);
        }

        let take = self.chunk_size.min(self.pending.len());
        let chunk: Vec<u8> = self.pending.drain(..take).collect();
        Ok(Some(AudioChunk::from_bytes(chunk)))
    }
}
