//! Real-time speech transcription pipeline
//!
//! Streams audio from a live input device, feeds fixed-size PCM chunks to a
//! speech recognition engine, and aggregates partial and final hypotheses
//! into a display-friendly transcript. Also supports single-shot
//! transcription of pre-recorded audio files.
//!
//! # Architecture
//!
//! - `audio`: chunked frame sources (live capture via cpal, WAV files)
//! - `engine`: speech engine abstraction and backends
//! - `recognizer`: adapter decoding engine payloads into recognition events
//! - `transcript`: partial/final aggregation state machine
//! - `session`: streaming session lifecycle and capture loop
//! - `job`: one-shot file transcription
//! - `output`: console display and transcript file writing
//! - `config`: configuration structures
//! - `error`: error types
//!
//! # Example
//!
//! ```no_run
//! use vox_transcriber::{MicCapture, Recognizer, StreamingSession};
//! use vox_transcriber::config::AudioConfig;
//!
//! # fn engine() -> Box<dyn vox_transcriber::SpeechEngine + Send> { unimplemented!() }
//! let mut capture = MicCapture::new(AudioConfig::default());
//! capture.open().unwrap();
//!
//! let mut session = StreamingSession::new(
//!     Box::new(capture.frame_source()),
//!     Recognizer::new(engine()),
//! );
//! capture.start().unwrap();
//! session.start().unwrap();
//! ```

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod job;
pub mod output;
pub mod recognizer;
pub mod session;
pub mod transcript;

// Re-exports for convenience
pub use audio::{AudioChunk, FileFrameSource, FrameSource, MicCapture, MicFrameSource};
pub use config::{AudioConfig, Config, OutputConfig, RecognizerConfig};
pub use engine::{SpeechEngine, WaveformState};
pub use error::{
    AudioError, RecognizerError, Result, SessionError, TranscriberError,
};
pub use job::FileTranscriptionJob;
pub use output::{LiveDisplay, TranscriptWriter};
pub use recognizer::{RecognitionEvent, Recognizer};
pub use session::{Lifecycle, StreamingSession};
pub use transcript::{TranscriptAggregator, TranscriptEvent, TranscriptState};

#[cfg(feature = "vosk-engine")]
pub use engine::VoskEngine;
