//! Real-time speech transcription CLI

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use vox_transcriber::engine::model_language;
use vox_transcriber::{
    audio, Config, FileFrameSource, FileTranscriptionJob, Lifecycle, LiveDisplay, MicCapture,
    Recognizer, SpeechEngine, StreamingSession, TranscriptEvent, TranscriptWriter,
};

/// Real-time speech transcriber
#[derive(Parser)]
#[command(name = "vox-transcriber")]
#[command(about = "Real-time speech-to-text with live partial results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start real-time transcription from the microphone
    Run {
        /// Path to the recognition model directory
        model: PathBuf,

        /// Audio input device name (uses default if not specified)
        #[arg(short, long)]
        device: Option<String>,

        /// Append final segments to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Transcribe an audio file
    Transcribe {
        /// Input WAV file path
        input: PathBuf,

        /// Path to the recognition model directory
        model: PathBuf,
    },

    /// List available audio input devices
    Devices,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Quiet by default so log lines do not fight the live display
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    let mut config = if let Some(ref config_path) = cli.config {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Run {
            model,
            device,
            output,
        } => {
            config.recognizer.model_path = model;
            if let Some(device) = device {
                config.audio.device = Some(device);
            }
            if let Some(output) = output {
                config.output.transcript_path = Some(output);
            }
            run_realtime(config)
        }
        Commands::Transcribe { input, model } => {
            config.recognizer.model_path = model;
            transcribe_file(config, input)
        }
        Commands::Devices => list_devices(config),
    }
}

#[cfg(feature = "vosk-engine")]
fn build_engine(config: &Config) -> Result<Box<dyn SpeechEngine + Send>> {
    let engine = vox_transcriber::VoskEngine::open(&config.recognizer.model_path)
        .context("Failed to load recognition model")?;
    Ok(Box::new(engine))
}

#[cfg(not(feature = "vosk-engine"))]
fn build_engine(_config: &Config) -> Result<Box<dyn SpeechEngine + Send>> {
    anyhow::bail!(
        "no speech engine compiled in; rebuild with `--features vosk-engine` \
         (requires libvosk)"
    )
}

/// Run real-time transcription until Ctrl+C or the device closes
fn run_realtime(config: Config) -> Result<()> {
    let model_path = config.recognizer.model_path.display().to_string();
    println!("Model: {}", model_path);
    println!("Sample rate: {} Hz", audio::SAMPLE_RATE);
    println!("Language: {}", model_language(&model_path));

    // Engine first: it is the most likely thing to fail
    let engine = build_engine(&config)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        flag.store(true, Ordering::SeqCst);
    })?;

    let mut capture = MicCapture::new(config.audio.clone());
    capture.open().context("Failed to open audio input")?;

    let mut session = StreamingSession::new(
        Box::new(capture.frame_source()),
        Recognizer::new(engine),
    );
    let transcript = session.transcript();

    if config.output.enable_console {
        let mut display = LiveDisplay::new();
        transcript.subscribe(move |event| display.render(event));
    }

    if let Some(ref path) = config.output.transcript_path {
        let mut writer = TranscriptWriter::create(path.clone())
            .with_context(|| format!("Failed to open transcript file {}", path.display()))?;
        info!("Appending final segments to {}", writer.path().display());
        transcript.subscribe(move |event| {
            if let TranscriptEvent::FinalSegment(text) = event {
                if let Err(e) = writer.write_segment(text) {
                    error!("Failed to write transcript file: {}", e);
                }
            }
        });
    }

    capture.start().context("Failed to start audio capture")?;
    session.start().context("Failed to start session")?;

    println!("Listening... Press Ctrl+C to stop");
    println!("----------------------------------------");

    while !shutdown.load(Ordering::SeqCst) && session.lifecycle() != Lifecycle::Stopped {
        std::thread::sleep(Duration::from_millis(100));
    }

    session.request_stop();
    // Closing the device unblocks the capture loop promptly
    capture.stop();

    if let Err(e) = session.await_stopped(Duration::from_secs(3)) {
        warn!("Forcing shutdown: {}", e);
    }
    session.cleanup();

    println!("----------------------------------------");
    println!("Complete transcription:");
    println!("{}", transcript.finalize());

    Ok(())
}

/// Transcribe an audio file in one pass
fn transcribe_file(config: Config, input: PathBuf) -> Result<()> {
    info!("Transcribing: {}", input.display());

    let engine = build_engine(&config)?;
    let source = FileFrameSource::open(&input, config.audio.chunk_size)
        .with_context(|| format!("Failed to open {}", input.display()))?;

    let job = FileTranscriptionJob::new(Box::new(source), Recognizer::new(engine));
    let transcription = job.run()?;

    println!("{}", transcription);
    Ok(())
}

/// List available audio input devices
fn list_devices(config: Config) -> Result<()> {
    let capture = MicCapture::new(config.audio);
    let devices = capture.list_devices()?;

    if devices.is_empty() {
        println!("No audio input devices found");
    } else {
        println!("Available audio input devices:");
        for (i, name) in devices.iter().enumerate() {
            println!("  {}. {}", i + 1, name);
        }
    }

    Ok(())
}
