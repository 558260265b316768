//! Integration tests for vox-transcriber

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vox_transcriber::{
    audio, AudioChunk, AudioError, FileFrameSource, FileTranscriptionJob, FrameSource, Lifecycle,
    RecognitionEvent, Recognizer, RecognizerError, SpeechEngine, StreamingSession,
    TranscriptAggregator, TranscriptEvent, WaveformState,
};

/// Engine replaying a scripted sequence of (state, payload) pairs
struct ScriptedEngine {
    script: Vec<(WaveformState, String)>,
    pending: String,
    flush_payload: String,
    flush_count: Arc<AtomicUsize>,
}

impl ScriptedEngine {
    fn new(script: Vec<(WaveformState, &str)>, flush_payload: &str) -> Self {
        Self {
            script: script
                .into_iter()
                .rev()
                .map(|(s, p)| (s, p.to_string()))
                .collect(),
            pending: String::new(),
            flush_payload: flush_payload.to_string(),
            flush_count: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl SpeechEngine for ScriptedEngine {
    fn accept_waveform(&mut self, _pcm: &[u8]) -> Result<WaveformState, RecognizerError> {
        let (state, payload) = self
            .script
            .pop()
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
        self.flush_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.flush_payload.clone())
    }
}

/// Finite in-memory frame source
struct ByteSource {
    chunks: Vec<Vec<u8>>,
}

impl FrameSource for ByteSource {
    fn next_chunk(&mut self) -> Result<Option<AudioChunk>, AudioError> {
        if self.chunks.is_empty() {
            Ok(None)
        } else {
            Ok(Some(AudioChunk::from_bytes(self.chunks.remove(0))))
        }
    }
}

fn collect_events(aggregator: &TranscriptAggregator) -> Arc<Mutex<Vec<TranscriptEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    aggregator.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

#[test]
fn test_streaming_session_full_run() {
    let engine = ScriptedEngine::new(
        vec![
            (WaveformState::Running, r#"{"partial": "how"}"#),
            (WaveformState::Running, r#"{"partial": "how are"}"#),
            (WaveformState::Running, r#"{"partial": "how are"}"#),
            (WaveformState::Finalized, r#"{"text": "how are you"}"#),
            (WaveformState::Running, r#"{"partial": "fine"}"#),
        ],
        r#"{"text": "fine thanks"}"#,
    );
    let flush_count = Arc::clone(&engine.flush_count);

    let mut session = StreamingSession::new(
        Box::new(ByteSource {
            chunks: vec![vec![0u8; 64]; 5],
        }),
        Recognizer::new(Box::new(engine)),
    );

    let transcript = session.transcript();
    let events = collect_events(&transcript);

    session.start().unwrap();
    session.await_stopped(Duration::from_secs(5)).unwrap();
    assert_eq!(session.lifecycle(), Lifecycle::Stopped);
    assert_eq!(flush_count.load(Ordering::SeqCst), 1);

    // The repeated "how are" partial is de-duplicated
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            TranscriptEvent::PartialUpdate("how".to_string()),
            TranscriptEvent::PartialUpdate("how are".to_string()),
            TranscriptEvent::FinalSegment("how are you".to_string()),
            TranscriptEvent::PartialUpdate("fine".to_string()),
            TranscriptEvent::FinalSegment("fine thanks".to_string()),
        ]
    );

    let state = transcript.snapshot();
    assert_eq!(state.complete_text, "how are you fine thanks");
    assert_eq!(state.last_partial, "");
    assert_eq!(transcript.finalize(), "how are you fine thanks");

    session.cleanup();
}

#[test]
fn test_transcript_matches_final_texts_in_order() {
    let aggregator = TranscriptAggregator::new();

    let finals = ["alpha", "", "beta", "gamma", ""];
    for text in finals {
        aggregator.apply(RecognitionEvent::Final(text.to_string()));
    }

    assert_eq!(aggregator.finalize(), "alpha beta gamma");
}

#[test]
fn test_file_job_over_decoded_wav() {
    // Write a short WAV, decode it through the real file source, and feed the
    // chunks to a scripted engine.
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio::SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let path = std::env::temp_dir().join("vox_transcriber_job_fixture.wav");
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..(audio::SAMPLE_RATE / 2) {
        let t = i as f32 / audio::SAMPLE_RATE as f32;
        let s = (0.2 * (2.0 * std::f32::consts::PI * 220.0 * t).sin() * i16::MAX as f32) as i16;
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();

    // 0.5s -> 16000 bytes -> 3 full chunks + 1 trailing
    let engine = ScriptedEngine::new(
        vec![
            (WaveformState::Running, r#"{"partial": "he"}"#),
            (WaveformState::Finalized, r#"{"text": "hello"}"#),
            (WaveformState::Running, r#"{"partial": "wor"}"#),
            (WaveformState::Running, r#"{"partial": "worl"}"#),
        ],
        r#"{"text": "world"}"#,
    );

    let source = FileFrameSource::open(&path, audio::CHUNK_SIZE).unwrap();
    let job = FileTranscriptionJob::new(Box::new(source), Recognizer::new(Box::new(engine)));
    assert_eq!(job.run().unwrap(), "hello world");
}

#[test]
fn test_job_recovers_from_bad_payload() {
    let engine = ScriptedEngine::new(
        vec![
            (WaveformState::Finalized, "{{{corrupt"),
            (WaveformState::Finalized, r#"{"text": "still here"}"#),
        ],
        r#"{"text": ""}"#,
    );

    let job = FileTranscriptionJob::new(
        Box::new(ByteSource {
            chunks: vec![vec![0u8; 64]; 2],
        }),
        Recognizer::new(Box::new(engine)),
    );
    assert_eq!(job.run().unwrap(), "still here");
}

#[test]
fn test_snapshot_during_session() {
    let engine = ScriptedEngine::new(
        vec![(WaveformState::Finalized, r#"{"text": "first"}"#)],
        r#"{"text": ""}"#,
    );

    let mut session = StreamingSession::new(
        Box::new(ByteSource {
            chunks: vec![vec![0u8; 64]],
        }),
        Recognizer::new(Box::new(engine)),
    );
    let transcript = session.transcript();

    session.start().unwrap();
    session.await_stopped(Duration::from_secs(5)).unwrap();

    // Snapshots are always a consistent (complete, partial) pair
    let state = transcript.snapshot();
    assert_eq!(state.complete_text, "first");
    assert_eq!(state.last_partial, "");
}
