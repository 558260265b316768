//! Recognizer port: adapts a speech engine into trimmed recognition events
//!
//! The port owns its engine exclusively; `&mut self` on every call keeps
//! engine access serialized without asking callers to lock anything.

use serde::Deserialize;
use tracing::trace;

use crate::audio::AudioChunk;
use crate::engine::{SpeechEngine, WaveformState};
use crate::error::RecognizerError;

/// One recognition hypothesis per chunk fed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Tentative, still-revisable hypothesis
    Partial(String),
    /// Hypothesis the engine will not revise
    Final(String),
}

impl RecognitionEvent {
    pub fn text(&self) -> &str {
        match self {
            RecognitionEvent::Partial(text) | RecognitionEvent::Final(text) => text,
        }
    }
}

#[derive(Deserialize)]
struct FinalPayload {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct PartialPayload {
    #[serde(default)]
    partial: String,
}

/// Adapter over a [`SpeechEngine`]
pub struct Recognizer {
    engine: Box<dyn SpeechEngine + Send>,
}

impl Recognizer {
    pub fn new(engine: Box<dyn SpeechEngine + Send>) -> Self {
        Self { engine }
    }

    /// Feed one chunk and classify the engine's answer.
    ///
    /// Event text is always whitespace-trimmed; it may be empty.
    pub fn accept_chunk(&mut self, chunk: &AudioChunk) -> Result<RecognitionEvent, RecognizerError> {
        match self.engine.accept_waveform(chunk.bytes())? {
            WaveformState::Finalized => {
                let payload = self.engine.result()?;
                let text = decode_final(&payload)?;
                trace!("final result: {:?}", text);
                Ok(RecognitionEvent::Final(text))
            }
            WaveformState::Running => {
                let payload = self.engine.partial_result()?;
                let text = decode_partial(&payload)?;
                trace!("partial result: {:?}", text);
                Ok(RecognitionEvent::Partial(text))
            }
        }
    }

    /// Force a final result for any buffered audio at stream end.
    ///
    /// Always yields a `Final` event, possibly with empty text.
    pub fn flush(&mut self) -> Result<RecognitionEvent, RecognizerError> {
        let payload = self.engine.final_result()?;
        let text = decode_final(&payload)?;
        trace!("flush result: {:?}", text);
        Ok(RecognitionEvent::Final(text))
    }
}

fn decode_final(payload: &str) -> Result<String, RecognizerError> {
    let parsed: FinalPayload =
        serde_json::from_str(payload).map_err(|e| RecognizerError::Payload(e.to_string()))?;
    Ok(parsed.text.trim().to_string())
}

fn decode_partial(payload: &str) -> Result<String, RecognizerError> {
    let parsed: PartialPayload =
        serde_json::from_str(payload).map_err(|e| RecognizerError::Payload(e.to_string()))?;
    Ok(parsed.partial.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Engine replaying a fixed script of (state, payload) pairs
    struct ScriptedEngine {
        steps: VecDeque<(WaveformState, String)>,
        pending: String,
        flush_payload: String,
    }

    impl ScriptedEngine {
        fn new(steps: Vec<(WaveformState, &str)>, flush_payload: &str) -> Self {
            Self {
                steps: steps
                    .into_iter()
                    .map(|(s, p)| (s, p.to_string()))
                    .collect(),
                pending: String::new(),
                flush_payload: flush_payload.to_string(),
            }
        }
    }

    impl SpeechEngine for ScriptedEngine {
        fn accept_waveform(&mut self, _pcm: &[u8]) -> Result<WaveformState, RecognizerError> {
            let (state, payload) = self
                .steps
                .pop_front()
                .unwrap_or((WaveformState::Running, r#"{"partial": ""}"#.to_string()));
            self.pending = payload;
            Ok(state)
        }

        fn result(&mut self) -> Result<String, RecognizerError> {
            Ok(std::mem::take(&mut self.pending))
        }

        fn partial_result(&mut self) -> Result<String, RecognizerError> {
            Ok(std::mem::take(&mut self.pending))
        }

        fn final_result(&mut self) -> Result<String, RecognizerError> {
            Ok(self.flush_payload.clone())
        }
    }

    fn chunk() -> AudioChunk {
        AudioChunk::from_bytes(vec![0; 32])
    }

    #[test]
    fn test_partial_and_final_decoding() {
        let engine = ScriptedEngine::new(
            vec![
                (WaveformState::Running, r#"{"partial": "  hel "}"#),
                (WaveformState::Finalized, r#"{"text": " hello world "}"#),
            ],
            r#"{"text": ""}"#,
        );
        let mut recognizer = Recognizer::new(Box::new(engine));

        assert_eq!(
            recognizer.accept_chunk(&chunk()).unwrap(),
            RecognitionEvent::Partial("hel".to_string())
        );
        assert_eq!(
            recognizer.accept_chunk(&chunk()).unwrap(),
            RecognitionEvent::Final("hello world".to_string())
        );
    }

    #[test]
    fn test_flush_is_final() {
        let engine = ScriptedEngine::new(vec![], r#"{"text": " tail "}"#);
        let mut recognizer = Recognizer::new(Box::new(engine));
        assert_eq!(
            recognizer.flush().unwrap(),
            RecognitionEvent::Final("tail".to_string())
        );
    }

    #[test]
    fn test_missing_field_defaults_to_empty() {
        let engine = ScriptedEngine::new(vec![(WaveformState::Finalized, r#"{}"#)], r#"{}"#);
        let mut recognizer = Recognizer::new(Box::new(engine));
        assert_eq!(
            recognizer.accept_chunk(&chunk()).unwrap(),
            RecognitionEvent::Final(String::new())
        );
        assert_eq!(
            recognizer.flush().unwrap(),
            RecognitionEvent::Final(String::new())
        );
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        let engine = ScriptedEngine::new(
            vec![(WaveformState::Finalized, "not json")],
            r#"{"text": ""}"#,
        );
        let mut recognizer = Recognizer::new(Box::new(engine));
        let result = recognizer.accept_chunk(&chunk());
        assert!(matches!(result, Err(RecognizerError::Payload(_))));
    }
}
