//! One-shot file transcription
//!
//! Same chunk loop as the streaming session, minus the worker thread and
//! the partial results: file mode has no live display to feed.

use tracing::{debug, warn};

use crate::audio::FrameSource;
use crate::error::Result;
use crate::recognizer::{RecognitionEvent, Recognizer};

/// Single-pass transcription of a finite frame source
pub struct FileTranscriptionJob {
    source: Box<dyn FrameSource>,
    recognizer: Recognizer,
}

impl FileTranscriptionJob {
    pub fn new(source: Box<dyn FrameSource>, recognizer: Recognizer) -> Self {
        Self { source, recognizer }
    }

    /// Drain the source and return the space-joined final texts plus the
    /// flush result, trimmed.
    pub fn run(mut self) -> Result<String> {
        let mut segments: Vec<String> = Vec::new();

        while let Some(chunk) = self.source.next_chunk()? {
            match self.recognizer.accept_chunk(&chunk) {
                Ok(RecognitionEvent::Final(text)) if !text.is_empty() => {
                    debug!("final segment: {:?}", text);
                    segments.push(text);
                }
                Ok(_) => {} // partials and empty finals are discarded
                Err(e) => warn!("Recognition error, skipping chunk: {}", e),
            }
        }

        if let RecognitionEvent::Final(text) = self.recognizer.flush()? {
            if !text.is_empty() {
                segments.push(text);
            }
        }

        Ok(segments.join(" "))
    }
}
