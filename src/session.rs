//! Streaming session lifecycle and capture loop
//!
//! A session owns its frame source and recognizer exclusively. `start`
//! moves both into a dedicated worker thread running the capture loop;
//! the caller keeps the session handle for stop/await/cleanup and the
//! shared transcript for snapshots.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::audio::FrameSource;
use crate::error::SessionError;
use crate::recognizer::Recognizer;
use crate::transcript::TranscriptAggregator;

/// Session lifecycle; `Stopped` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Lifecycle {
    Idle,
    Running,
    Stopping,
    Stopped,
}

struct Shared {
    lifecycle: Mutex<Lifecycle>,
    stopped: Condvar,
    stop_requested: AtomicBool,
}

impl Shared {
    /// Move the lifecycle forward; transitions never go backwards and
    /// nothing leaves `Stopped`.
    fn advance(&self, to: Lifecycle) {
        let mut lifecycle = self.lifecycle.lock();
        if *lifecycle < to {
            debug!("lifecycle: {:?} -> {:?}", *lifecycle, to);
            *lifecycle = to;
            self.stopped.notify_all();
        }
    }
}

/// Orchestrates source -> recognizer -> transcript under a cancellable loop
pub struct StreamingSession {
    shared: Arc<Shared>,
    aggregator: Arc<TranscriptAggregator>,
    source: Option<Box<dyn FrameSource>>,
    recognizer: Option<Recognizer>,
    worker: Option<JoinHandle<()>>,
}

impl StreamingSession {
    pub fn new(source: Box<dyn FrameSource>, recognizer: Recognizer) -> Self {
        Self {
            shared: Arc::new(Shared {
                lifecycle: Mutex::new(Lifecycle::Idle),
                stopped: Condvar::new(),
                stop_requested: AtomicBool::new(false),
            }),
            aggregator: Arc::new(TranscriptAggregator::new()),
            source: Some(source),
            recognizer: Some(recognizer),
            worker: None,
        }
    }

    /// Shared transcript; safe to snapshot while the session runs
    pub fn transcript(&self) -> Arc<TranscriptAggregator> {
        Arc::clone(&self.aggregator)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.shared.lifecycle.lock()
    }

    /// Spawn the capture worker. Valid only from `Idle`, and only while the
    /// source and recognizer have not been released by `cleanup`.
    pub fn start(&mut self) -> Result<(), SessionError> {
        let mut lifecycle = self.shared.lifecycle.lock();
        if *lifecycle != Lifecycle::Idle {
            return Err(SessionError::AlreadyStarted);
        }
        // Resources go before the lifecycle commits to Running, so a cleaned
        // session stays Idle instead of wedging with no worker.
        let (source, recognizer) = match (self.source.take(), self.recognizer.take()) {
            (Some(source), Some(recognizer)) => (source, recognizer),
            _ => return Err(SessionError::Released),
        };
        *lifecycle = Lifecycle::Running;
        drop(lifecycle);

        let shared = Arc::clone(&self.shared);
        let aggregator = Arc::clone(&self.aggregator);
        self.worker = Some(thread::spawn(move || {
            capture_loop(source, recognizer, aggregator, shared);
        }));

        info!("Streaming session started");
        Ok(())
    }

    /// Ask the capture loop to exit after its current chunk.
    ///
    /// Idempotent; does not pre-empt a blocking read already in flight.
    /// Close the capture device as well for prompt cancellation.
    pub fn request_stop(&self) {
        let mut lifecycle = self.shared.lifecycle.lock();
        if *lifecycle == Lifecycle::Running {
            info!("Stop requested");
            *lifecycle = Lifecycle::Stopping;
            self.shared.stop_requested.store(true, Ordering::SeqCst);
        }
    }

    /// Wait until the worker has exited and the final flush was applied.
    pub fn await_stopped(&mut self, timeout: Duration) -> Result<(), SessionError> {
        {
            let mut lifecycle = self.shared.lifecycle.lock();
            if *lifecycle == Lifecycle::Idle {
                return Err(SessionError::NotStarted);
            }
            let result = self
                .shared
                .stopped
                .wait_while_for(&mut lifecycle, |lc| *lc != Lifecycle::Stopped, timeout);
            if result.timed_out() {
                return Err(SessionError::StopTimeout);
            }
        }

        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        Ok(())
    }

    /// Release resources; idempotent and safe even when `start` never ran.
    pub fn cleanup(&mut self) {
        self.shared.stop_requested.store(true, Ordering::SeqCst);
        self.source = None;
        self.recognizer = None;

        if let Some(worker) = self.worker.take() {
            if worker.is_finished() {
                let _ = worker.join();
            } else {
                // Forced shutdown with a stuck blocking read; the worker is
                // detached rather than joined so shutdown can make progress.
                warn!("Capture worker still running at cleanup; detaching");
            }
        }
    }
}

fn capture_loop(
    mut source: Box<dyn FrameSource>,
    mut recognizer: Recognizer,
    aggregator: Arc<TranscriptAggregator>,
    shared: Arc<Shared>,
) {
    while !shared.stop_requested.load(Ordering::SeqCst) {
        match source.next_chunk() {
            Ok(Some(chunk)) => match recognizer.accept_chunk(&chunk) {
                Ok(event) => aggregator.apply(event),
                // A bad chunk never aborts the session
                Err(e) => warn!("Recognition error, skipping chunk: {}", e),
            },
            Ok(None) => {
                debug!("End of audio stream");
                break;
            }
            Err(e) => {
                error!("Audio source failed: {}", e);
                break;
            }
        }
    }

    shared.advance(Lifecycle::Stopping);

    match recognizer.flush() {
        Ok(event) => aggregator.apply(event),
        Err(e) => warn!("Flush failed: {}", e),
    }

    shared.advance(Lifecycle::Stopped);
    info!("Capture loop exited");
}
