//! Speech engine abstraction
//!
//! The trait mirrors the surface of a streaming recognizer: feed a waveform
//! chunk, learn whether the engine finalized an utterance, then fetch the
//! matching result payload. Payloads are the engine's own interchange format
//! (JSON for Vosk-style engines); decoding them is the recognizer port's job.

use crate::error::RecognizerError;

#[cfg(feature = "vosk-engine")]
pub mod vosk;

#[cfg(feature = "vosk-engine")]
pub use vosk::VoskEngine;

/// Outcome of feeding one waveform chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveformState {
    /// The engine is still accumulating audio; a partial hypothesis is available
    Running,
    /// The engine finalized an utterance; a final result is available
    Finalized,
}

/// A streaming speech recognition engine.
///
/// Instances are not safe for concurrent use; callers must serialize access.
pub trait SpeechEngine: Send {
    /// Feed one chunk of raw PCM (mono, 16-bit signed, 16 kHz, little-endian).
    ///
    /// A short trailing chunk, including an odd byte count, must be accepted.
    fn accept_waveform(&mut self, pcm: &[u8]) -> Result<WaveformState, RecognizerError>;

    /// Final result payload for the utterance just finalized
    fn result(&mut self) -> Result<String, RecognizerError>;

    /// Partial hypothesis payload for the in-progress utterance
    fn partial_result(&mut self) -> Result<String, RecognizerError>;

    /// Force a final result payload for any buffered audio (stream end)
    fn final_result(&mut self) -> Result<String, RecognizerError>;
}

/// Guess a human-readable language name from a model directory name
pub fn model_language(model_path: &str) -> &'static str {
    let path = model_path.to_lowercase();
    if path.contains("en") {
        "English"
    } else if path.contains("de") {
        "German"
    } else if path.contains("fr") {
        "French"
    } else if path.contains("es") {
        "Spanish"
    } else if path.contains("ru") {
        "Russian"
    } else if path.contains("zh") {
        "Chinese"
    } else {
        "Unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_language() {
        assert_eq!(model_language("./vosk-model-en-us-0.22"), "English");
        assert_eq!(model_language("/opt/models/vosk-model-de-0.21"), "German");
        assert_eq!(model_language("model"), "Unknown");
    }
}
