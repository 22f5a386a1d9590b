//! sightlined - assistive perception daemon
//!
//! This daemon:
//! 1. Opens the configured camera (fatal if it cannot be opened)
//! 2. Spawns the voice-trigger listener thread (non-fatal if the mic fails)
//! 3. Runs the arbitration loop: detection narration, proximity alerts,
//!    and voice-triggered OCR, with all speech serialized
//! 4. Stops cleanly on Ctrl-C

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use sightline::{
    Arbiter, CameraSource, SightlineConfig, StubDetector, StubRecognizer, StubSpeech,
    StubTranscriber, TriggerFlag, VoiceListener,
};

#[derive(Parser, Debug)]
#[command(name = "sightlined", version, about = "Assistive perception daemon")]
struct Cli {
    /// Config file path (JSON). Defaults to the SIGHTLINE_CONFIG env var.
    #[arg(long, env = "SIGHTLINE_CONFIG")]
    config: Option<PathBuf>,

    /// ONNX detector model path (requires the backend-tract feature).
    #[arg(long, env = "SIGHTLINE_DETECTOR_MODEL")]
    detector_model: Option<PathBuf>,

    /// Whisper ggml model path (requires the stt-whisper feature).
    #[arg(long, env = "SIGHTLINE_WHISPER_MODEL")]
    whisper_model: Option<PathBuf>,

    /// Disable the voice-trigger listener entirely.
    #[arg(long)]
    no_listener: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = SightlineConfig::load_from(cli.config.as_deref()).context("config load failed")?;

    log::info!("--- sightline {} starting ---", env!("CARGO_PKG_VERSION"));
    log::info!(
        "camera={} {}x{}@{}fps phrase='{}' threshold={}",
        cfg.camera.device,
        cfg.camera.width,
        cfg.camera.height,
        cfg.camera.target_fps,
        cfg.voice.command_phrase,
        cfg.alerts.proximity_threshold
    );

    // Camera failure is process-fatal: perception is the whole point.
    let mut camera = CameraSource::new(cfg.camera.clone())?;
    camera.connect().context("cannot open camera")?;

    let detector = build_detector(&cli, &cfg)?;
    let recognizer = build_recognizer()?;
    let speech = build_speech()?;

    let trigger = TriggerFlag::new();
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            log::info!("shutdown signal received");
            stop.store(true, Ordering::SeqCst);
        })
        .context("failed to install signal handler")?;
    }

    let listener_handle = if cli.no_listener {
        log::info!("voice listener disabled by flag; perception only");
        None
    } else {
        let transcriber = build_transcriber(&cli)?;
        let listener = VoiceListener::new(
            cfg.audio.clone(),
            cfg.voice.clone(),
            transcriber,
            trigger.clone(),
        );
        Some(listener.spawn(Arc::clone(&stop))?)
    };

    let mut arbiter = Arbiter::new(cfg.alerts.clone(), detector, recognizer, speech, trigger);
    let result = arbiter.run(&mut camera, cfg.camera.target_fps, &stop);

    // The loop only returns once the stop flag is raised; reap the listener.
    stop.store(true, Ordering::SeqCst);
    if let Some(handle) = listener_handle {
        if handle.join().is_err() {
            log::error!("voice listener thread panicked");
        }
    }

    log::info!("sightlined stopped");
    result
}

fn build_detector(cli: &Cli, cfg: &SightlineConfig) -> Result<Box<dyn sightline::DetectorBackend>> {
    match &cli.detector_model {
        Some(path) => {
            #[cfg(feature = "backend-tract")]
            {
                let detector = sightline::detect::TractDetector::new(
                    path,
                    cfg.camera.width,
                    cfg.camera.height,
                )?;
                log::info!("detector: tract ({})", path.display());
                Ok(Box::new(detector))
            }
            #[cfg(not(feature = "backend-tract"))]
            {
                anyhow::bail!(
                    "detector model {} requires the backend-tract feature",
                    path.display()
                )
            }
        }
        None => {
            let _ = cfg;
            log::warn!("no detector model configured; using stub detector");
            Ok(Box::new(StubDetector::new()))
        }
    }
}

fn build_recognizer() -> Result<Box<dyn sightline::TextRecognizer>> {
    #[cfg(feature = "ocr-leptess")]
    {
        let recognizer = sightline::ocr::TesseractRecognizer::new(None, "eng")?;
        log::info!("ocr: tesseract");
        Ok(Box::new(recognizer))
    }
    #[cfg(not(feature = "ocr-leptess"))]
    {
        log::warn!("built without ocr-leptess; using stub recognizer");
        Ok(Box::new(StubRecognizer::new()))
    }
}

fn build_speech() -> Result<Box<dyn sightline::SpeechEngine>> {
    #[cfg(feature = "speech-native")]
    {
        let engine = sightline::speech::NativeSpeech::new()?;
        log::info!("speech: native TTS");
        Ok(Box::new(engine))
    }
    #[cfg(not(feature = "speech-native"))]
    {
        log::warn!("built without speech-native; utterances go to the log only");
        Ok(Box::new(StubSpeech::new()))
    }
}

fn build_transcriber(cli: &Cli) -> Result<Box<dyn sightline::Transcriber>> {
    match &cli.whisper_model {
        Some(path) => {
            #[cfg(feature = "stt-whisper")]
            {
                let transcriber = sightline::listen::WhisperTranscriber::new(
                    &path.to_string_lossy(),
                    Some("en".to_string()),
                )?;
                log::info!("transcriber: whisper ({})", path.display());
                Ok(Box::new(transcriber))
            }
            #[cfg(not(feature = "stt-whisper"))]
            {
                anyhow::bail!(
                    "whisper model {} requires the stt-whisper feature",
                    path.display()
                )
            }
        }
        None => {
            log::warn!("no whisper model configured; using stub transcriber (voice trigger inert)");
            Ok(Box::new(StubTranscriber::new()))
        }
    }
}
