#![cfg(feature = "speech-native")]

use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::speech::SpeechEngine;

/// Poll interval while waiting for playback to finish.
const PLAYBACK_POLL: Duration = Duration::from_millis(50);

/// Platform text-to-speech via the `tts` crate (Speech Dispatcher on Linux).
///
/// The crate's `speak` call queues asynchronously, so this backend polls
/// `is_speaking` to provide the blocking contract the arbiter relies on.
pub struct NativeSpeech {
    engine: tts::Tts,
}

impl NativeSpeech {
    pub fn new() -> Result<Self> {
        let engine = tts::Tts::default().context("failed to initialize platform TTS")?;
        Ok(Self { engine })
    }
}

impl SpeechEngine for NativeSpeech {
    fn name(&self) -> &'static str {
        "native"
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        self.engine
            .speak(text, true)
            .map_err(|e| anyhow!("TTS playback failed: {}", e))?;

        // Block until the utterance drains. Platforms that cannot report
        // speaking state return Err; treat that as "already done".
        loop {
            match self.engine.is_speaking() {
                Ok(true) => std::thread::sleep(PLAYBACK_POLL),
                Ok(false) => break,
                Err(_) => break,
            }
        }
        Ok(())
    }
}
