//! Speech-to-text backends for the voice-trigger listener.

use std::collections::VecDeque;

use anyhow::Result;
#[cfg(feature = "stt-whisper")]
use anyhow::{anyhow, Context};

/// Speech-to-text backend.
///
/// Input is mono f32 PCM at the listener's configured sample rate; format
/// conversion is a capture-side concern, not part of this contract.
pub trait Transcriber: Send {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Transcribe a recorded chunk. An empty string means nothing was heard.
    fn transcribe(&mut self, samples: &[f32], sample_rate: u32) -> Result<String>;
}

/// Stub transcriber playing back scripted transcripts. Once the script runs
/// out it hears silence.
#[derive(Default)]
pub struct StubTranscriber {
    script: VecDeque<Result<String, String>>,
}

impl StubTranscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_transcript(&mut self, text: &str) -> &mut Self {
        self.script.push_back(Ok(text.to_string()));
        self
    }

    pub fn push_failure(&mut self, message: &str) -> &mut Self {
        self.script.push_back(Err(message.to_string()));
        self
    }
}

impl Transcriber for StubTranscriber {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn transcribe(&mut self, _samples: &[f32], _sample_rate: u32) -> Result<String> {
        match self.script.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow::anyhow!("stub transcriber failure: {}", message)),
            None => Ok(String::new()),
        }
    }
}

/// Whisper transcriber via whisper-rs (whisper.cpp bindings).
///
/// Expects 16 kHz mono input, the format whisper models are trained on.
#[cfg(feature = "stt-whisper")]
pub struct WhisperTranscriber {
    context: whisper_rs::WhisperContext,
    language: Option<String>,
}

#[cfg(feature = "stt-whisper")]
impl WhisperTranscriber {
    /// Load a ggml model from disk. `language` of None lets the model detect.
    pub fn new(model_path: &str, language: Option<String>) -> Result<Self> {
        let context = whisper_rs::WhisperContext::new_with_params(
            model_path,
            whisper_rs::WhisperContextParameters::default(),
        )
        .with_context(|| format!("failed to load whisper model from {}", model_path))?;
        Ok(Self { context, language })
    }
}

#[cfg(feature = "stt-whisper")]
impl Transcriber for WhisperTranscriber {
    fn name(&self) -> &'static str {
        "whisper"
    }

    fn transcribe(&mut self, samples: &[f32], sample_rate: u32) -> Result<String> {
        if sample_rate != 16_000 {
            log::warn!(
                "whisper expects 16 kHz input, capture is {} Hz; accuracy will suffer",
                sample_rate
            );
        }

        let mut state = self
            .context
            .create_state()
            .map_err(|e| anyhow!("failed to create whisper state: {}", e))?;

        let mut params = whisper_rs::FullParams::new(whisper_rs::SamplingStrategy::Greedy {
            best_of: 1,
        });
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_special(false);
        params.set_print_timestamps(false);
        if let Some(language) = self.language.as_deref() {
            params.set_language(Some(language));
        }

        state
            .full(params, samples)
            .map_err(|e| anyhow!("whisper inference failed: {}", e))?;

        let segments = state
            .full_n_segments()
            .map_err(|e| anyhow!("failed to read whisper segments: {}", e))?;
        let mut transcript = String::new();
        for i in 0..segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| anyhow!("failed to read whisper segment {}: {}", i, e))?;
            transcript.push_str(&segment);
        }

        Ok(transcript.trim().to_string())
    }
}
