//! Transcript aggregation state machine
//!
//! Consumes partial/final recognition events from a single writer (the
//! capture loop) and keeps a display-friendly transcript. Readers take
//! snapshots; they never observe a half-applied event.

use parking_lot::Mutex;
use tracing::debug;

use crate::recognizer::RecognitionEvent;

/// Notification delivered to subscribers on every accepted transcript change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// The live, not-yet-finalized hypothesis changed
    PartialUpdate(String),
    /// A segment was finalized and appended to the transcript
    FinalSegment(String),
}

/// Finalized transcript plus the live partial hypothesis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptState {
    /// Finalized segments joined by single spaces
    pub complete_text: String,
    /// Most recent partial hypothesis, cleared whenever a final is accepted
    pub last_partial: String,
}

type Subscriber = Box<dyn FnMut(&TranscriptEvent) + Send>;

/// Partial/final state machine with subscriber notification
#[derive(Default)]
pub struct TranscriptAggregator {
    state: Mutex<TranscriptState>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl TranscriptAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for transcript events, delivered in emission order
    pub fn subscribe<F>(&self, callback: F)
    where
        F: FnMut(&TranscriptEvent) + Send + 'static,
    {
        self.subscribers.lock().push(Box::new(callback));
    }

    /// Apply one recognition event.
    ///
    /// Empty-text events change no visible text and emit nothing, except
    /// that a final event always clears the live partial. Partials identical
    /// to the current one are suppressed to avoid redundant redraws.
    pub fn apply(&self, event: RecognitionEvent) {
        let emitted = {
            let mut state = self.state.lock();
            match event {
                RecognitionEvent::Final(text) => {
                    state.last_partial.clear();
                    if text.is_empty() {
                        None
                    } else {
                        if !state.complete_text.is_empty() {
                            state.complete_text.push(' ');
                        }
                        state.complete_text.push_str(&text);
                        Some(TranscriptEvent::FinalSegment(text))
                    }
                }
                RecognitionEvent::Partial(text) => {
                    if text.is_empty() || text == state.last_partial {
                        None
                    } else {
                        state.last_partial = text.clone();
                        Some(TranscriptEvent::PartialUpdate(text))
                    }
                }
            }
        };

        if let Some(event) = emitted {
            debug!("transcript event: {:?}", event);
            for subscriber in self.subscribers.lock().iter_mut() {
                subscriber(&event);
            }
        }
    }

    /// Consistent copy of the current transcript state
    pub fn snapshot(&self) -> TranscriptState {
        self.state.lock().clone()
    }

    /// Trimmed complete transcript.
    ///
    /// A dangling partial is not promoted; route the recognizer's flush
    /// result through `apply` first.
    pub fn finalize(&self) -> String {
        self.state.lock().complete_text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    fn recording_aggregator() -> (TranscriptAggregator, Arc<StdMutex<Vec<TranscriptEvent>>>) {
        let aggregator = TranscriptAggregator::new();
        let events = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        aggregator.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        (aggregator, events)
    }

    #[test]
    fn test_partials_then_final() {
        let (aggregator, events) = recording_aggregator();

        for partial in ["hel", "hell", "hello"] {
            aggregator.apply(RecognitionEvent::Partial(partial.to_string()));
        }
        aggregator.apply(RecognitionEvent::Final("hello world".to_string()));

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                TranscriptEvent::PartialUpdate("hel".to_string()),
                TranscriptEvent::PartialUpdate("hell".to_string()),
                TranscriptEvent::PartialUpdate("hello".to_string()),
                TranscriptEvent::FinalSegment("hello world".to_string()),
            ]
        );

        let state = aggregator.snapshot();
        assert_eq!(state.complete_text, "hello world");
        assert_eq!(state.last_partial, "");
    }

    #[test]
    fn test_finals_are_space_joined() {
        let (aggregator, _events) = recording_aggregator();

        aggregator.apply(RecognitionEvent::Final("foo".to_string()));
        aggregator.apply(RecognitionEvent::Final("bar".to_string()));

        assert_eq!(aggregator.finalize(), "foo bar");
    }

    #[test]
    fn test_repeated_partial_suppressed() {
        let (aggregator, events) = recording_aggregator();

        aggregator.apply(RecognitionEvent::Partial("hey".to_string()));
        aggregator.apply(RecognitionEvent::Partial("hey".to_string()));
        aggregator.apply(RecognitionEvent::Partial("hey there".to_string()));

        assert_eq!(events.lock().unwrap().len(), 2);
        assert_eq!(aggregator.snapshot().last_partial, "hey there");
    }

    #[test]
    fn test_empty_events_are_silent() {
        let (aggregator, events) = recording_aggregator();

        aggregator.apply(RecognitionEvent::Partial(String::new()));
        aggregator.apply(RecognitionEvent::Final(String::new()));

        assert!(events.lock().unwrap().is_empty());
        assert_eq!(aggregator.snapshot(), TranscriptState::default());
    }

    #[test]
    fn test_empty_final_still_clears_partial() {
        let (aggregator, events) = recording_aggregator();

        aggregator.apply(RecognitionEvent::Partial("dangling".to_string()));
        aggregator.apply(RecognitionEvent::Final(String::new()));

        let state = aggregator.snapshot();
        assert_eq!(state.last_partial, "");
        assert_eq!(state.complete_text, "");
        // only the partial emitted anything
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_snapshot_reflects_event_prefix() {
        let aggregator = TranscriptAggregator::new();

        aggregator.apply(RecognitionEvent::Final("one".to_string()));
        let first = aggregator.snapshot();
        aggregator.apply(RecognitionEvent::Partial("tw".to_string()));
        let second = aggregator.snapshot();

        assert_eq!(first.complete_text, "one");
        assert_eq!(first.last_partial, "");
        assert_eq!(second.complete_text, "one");
        assert_eq!(second.last_partial, "tw");
    }
}
