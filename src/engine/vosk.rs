//! Vosk-backed speech engine (requires the `vosk-engine` feature and libvosk)

use std::path::Path;
use tracing::info;
use vosk::{DecodingState, Model, Recognizer as VoskRecognizer};

use crate::audio::SAMPLE_RATE;
use crate::engine::{SpeechEngine, WaveformState};
use crate::error::RecognizerError;

/// Streaming recognizer backed by a Vosk model directory
pub struct VoskEngine {
    recognizer: VoskRecognizer,
    // Kept alive for the recognizer's lifetime
    _model: Model,
}

impl VoskEngine {
    pub fn open<P: AsRef<Path>>(model_path: P) -> Result<Self, RecognizerError> {
        let model_path = model_path.as_ref();
        if !model_path.is_dir() {
            return Err(RecognizerError::ModelNotFound(
                model_path.display().to_string(),
            ));
        }

        info!("Loading Vosk model from: {}", model_path.display());

        let model = Model::new(model_path.display().to_string()).ok_or_else(|| {
            RecognizerError::ModelLoad(model_path.display().to_string())
        })?;
        let recognizer = VoskRecognizer::new(&model, SAMPLE_RATE as f32).ok_or_else(|| {
            RecognizerError::ModelLoad("failed to create recognizer".to_string())
        })?;

        info!("Vosk model loaded");

        Ok(Self {
            recognizer,
            _model: model,
        })
    }
}

impl SpeechEngine for VoskEngine {
    fn accept_waveform(&mut self, pcm: &[u8]) -> Result<WaveformState, RecognizerError> {
        // An odd trailing byte is a truncated sample frame; drop it
        let samples: Vec<i16> = pcm
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();

        match self.recognizer.accept_waveform(&samples) {
            DecodingState::Finalized => Ok(WaveformState::Finalized),
            DecodingState::Running => Ok(WaveformState::Running),
            DecodingState::Failed => Err(RecognizerError::Engine(
                "waveform processing failed".to_string(),
            )),
        }
    }

    fn result(&mut self) -> Result<String, RecognizerError> {
        let text = self
            .recognizer
            .result()
            .single()
            .map(|r| r.text.to_string())
            .unwrap_or_default();
        Ok(serde_json::json!({ "text": text }).to_string())
    }

    fn partial_result(&mut self) -> Result<String, RecognizerError> {
        let partial = self.recognizer.partial_result().partial.to_string();
        Ok(serde_json::json!({ "partial": partial }).to_string())
    }

    fn final_result(&mut self) -> Result<String, RecognizerError> {
        let text = self
            .recognizer
            .final_result()
            .single()
            .map(|r| r.text.to_string())
            .unwrap_or_default();
        Ok(serde_json::json!({ "text": text }).to_string())
    }
}
