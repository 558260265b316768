//! Custom error types for the transcription pipeline

use thiserror::Error;

/// Top-level error type for the transcriber
#[derive(Error, Debug)]
pub enum TranscriberError {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio source errors (live capture and file decode)
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio input device available")]
    NoInputDevice,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("Audio file not found: {0}")]
    NotFound(String),
}

/// Recognition engine errors
#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Engine rejected waveform: {0}")]
    Engine(String),

    #[error("Failed to decode result payload: {0}")]
    Payload(String),
}

/// Session lifecycle errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session already started")]
    AlreadyStarted,

    #[error("Session not started")]
    NotStarted,

    #[error("Session resources released; construct a new session")]
    Released,

    #[error("Capture worker did not stop within the timeout")]
    StopTimeout,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, TranscriberError>;
