//! Voice-trigger listener.
//!
//! One background thread that repeatedly records a fixed-length microphone
//! chunk, transcribes it, and raises the shared trigger flag when the
//! case-folded transcript contains the command phrase. After a match the
//! listener sleeps out a cooldown window so a long utterance cannot
//! re-trigger while the command is still being handled.
//!
//! Failure isolation: a persistent microphone-open failure disables this
//! component (the thread exits after logging) while perception continues.
//! Per-chunk capture or transcription failures are logged and retried.

pub mod capture;
pub mod transcribe;

pub use capture::AudioCapture;
pub use transcribe::{StubTranscriber, Transcriber};
#[cfg(feature = "stt-whisper")]
pub use transcribe::WhisperTranscriber;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::{AudioSettings, VoiceSettings};
use crate::trigger::TriggerFlag;

/// Backoff after a failed capture or transcription.
const CHUNK_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Granularity of interruptible sleeps, so shutdown is not held up by a
/// cooldown window.
const SLEEP_SLICE: Duration = Duration::from_millis(200);

pub struct VoiceListener {
    audio: AudioSettings,
    voice: VoiceSettings,
    transcriber: Box<dyn Transcriber>,
    trigger: TriggerFlag,
}

impl VoiceListener {
    pub fn new(
        audio: AudioSettings,
        voice: VoiceSettings,
        transcriber: Box<dyn Transcriber>,
        trigger: TriggerFlag,
    ) -> Self {
        Self {
            audio,
            voice,
            transcriber,
            trigger,
        }
    }

    /// Spawn the listener thread. The thread never terminates the process;
    /// if the microphone cannot be opened it logs and exits, leaving the
    /// perception loop running alone.
    pub fn spawn(self, stop: Arc<AtomicBool>) -> Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("voice-listener".to_string())
            .spawn(move || {
                if let Err(e) = self.run(&stop) {
                    log::error!("voice listener disabled: {:#}", e);
                }
            })
            .context("failed to spawn voice listener thread")
    }

    fn run(mut self, stop: &AtomicBool) -> Result<()> {
        // The capture must be created on this thread (cpal streams are not
        // Send). An open failure here is persistent: report and disable.
        let mut capture =
            AudioCapture::open(&self.audio).context("microphone open failed")?;

        log::info!(
            "voice listener active: phrase='{}' transcriber={} chunk={:?}",
            self.voice.command_phrase,
            self.transcriber.name(),
            self.audio.record_duration
        );

        while !stop.load(Ordering::SeqCst) {
            let samples = match capture.record(self.audio.record_duration) {
                Ok(samples) => samples,
                Err(e) => {
                    log::warn!("audio chunk capture failed: {:#}", e);
                    sleep_unless_stopped(CHUNK_RETRY_BACKOFF, stop);
                    continue;
                }
            };

            if let Some(path) = self.audio.scratch_wav.as_deref() {
                // Scratch file only; overwritten every cycle, never read back.
                if let Err(e) = write_scratch_wav(path, &samples, capture.sample_rate()) {
                    log::warn!("scratch wav write failed: {:#}", e);
                }
            }

            let transcript = match self
                .transcriber
                .transcribe(&samples, capture.sample_rate())
            {
                Ok(transcript) => transcript,
                Err(e) => {
                    log::warn!("transcription failed: {:#}", e);
                    sleep_unless_stopped(CHUNK_RETRY_BACKOFF, stop);
                    continue;
                }
            };

            if contains_phrase(&transcript, &self.voice.command_phrase) {
                log::info!("command detected: '{}'", transcript.trim());
                self.trigger.raise();
                // Cooldown: don't re-trigger off the tail of the same
                // utterance while the OCR cycle is in flight.
                sleep_unless_stopped(self.voice.cooldown, stop);
            }
        }

        log::info!("voice listener stopped");
        Ok(())
    }
}

/// Case-folded substring containment. `phrase` must already be lowercase
/// (config validation guarantees it).
pub fn contains_phrase(transcript: &str, phrase: &str) -> bool {
    transcript.to_lowercase().contains(phrase)
}

fn sleep_unless_stopped(total: Duration, stop: &AtomicBool) {
    let mut remaining = total;
    while !remaining.is_zero() && !stop.load(Ordering::SeqCst) {
        let slice = remaining.min(SLEEP_SLICE);
        std::thread::sleep(slice);
        remaining -= slice;
    }
}

fn write_scratch_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer =
        hound::WavWriter::create(path, spec).context("failed to create scratch wav")?;
    for &sample in samples {
        let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer
            .write_sample(sample_i16)
            .context("failed to write scratch wav sample")?;
    }
    writer.finalize().context("failed to finalize scratch wav")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrase_match_is_case_folded_substring() {
        assert!(contains_phrase("please read this sign", "read this"));
        assert!(contains_phrase("Please READ THIS sign", "read this"));
        assert!(!contains_phrase("please read that sign", "read this"));
        assert!(!contains_phrase("", "read this"));
    }

    #[test]
    fn listener_raises_trigger_on_command() -> Result<()> {
        let audio = AudioSettings {
            device: "stub://silence".to_string(),
            sample_rate: 16_000,
            channels: 1,
            record_duration: Duration::from_millis(5),
            scratch_wav: None,
        };
        let voice = VoiceSettings {
            command_phrase: "read this".to_string(),
            cooldown: Duration::from_millis(5),
        };

        let mut transcriber = StubTranscriber::new();
        transcriber
            .push_transcript("nothing interesting")
            .push_transcript("please Read This sign");

        let trigger = TriggerFlag::new();
        let listener =
            VoiceListener::new(audio, voice, Box::new(transcriber), trigger.clone());

        let stop = Arc::new(AtomicBool::new(false));
        let handle = listener.spawn(Arc::clone(&stop))?;

        // Wait for the trigger, then stop the thread.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !trigger.is_raised() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        stop.store(true, Ordering::SeqCst);
        handle.join().expect("listener thread panicked");

        assert!(trigger.take());
        Ok(())
    }

    #[test]
    fn transcription_failure_is_retried_not_fatal() -> Result<()> {
        let audio = AudioSettings {
            device: "stub://silence".to_string(),
            sample_rate: 16_000,
            channels: 1,
            record_duration: Duration::from_millis(5),
            scratch_wav: None,
        };
        let voice = VoiceSettings {
            command_phrase: "read this".to_string(),
            cooldown: Duration::from_millis(5),
        };

        // A failed chunk must be logged and backed off, with the next chunk
        // still heard.
        let mut transcriber = StubTranscriber::new();
        transcriber
            .push_failure("decoder choked")
            .push_transcript("please read this sign");

        let trigger = TriggerFlag::new();
        let listener =
            VoiceListener::new(audio, voice, Box::new(transcriber), trigger.clone());

        let stop = Arc::new(AtomicBool::new(false));
        let handle = listener.spawn(Arc::clone(&stop))?;

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !trigger.is_raised() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        stop.store(true, Ordering::SeqCst);
        handle.join().expect("listener thread panicked");

        assert!(trigger.take());
        Ok(())
    }

    #[test]
    fn mic_open_failure_disables_listener_only() -> Result<()> {
        let audio = AudioSettings {
            device: "no-such-device-xyzzy".to_string(),
            sample_rate: 16_000,
            channels: 1,
            record_duration: Duration::from_millis(5),
            scratch_wav: None,
        };
        let voice = VoiceSettings {
            command_phrase: "read this".to_string(),
            cooldown: Duration::from_millis(5),
        };

        let trigger = TriggerFlag::new();
        let listener = VoiceListener::new(
            audio,
            voice,
            Box::new(StubTranscriber::new()),
            trigger.clone(),
        );

        // The open failure is persistent: the thread logs, exits cleanly,
        // and never raises the trigger. Nothing else is torn down.
        let stop = Arc::new(AtomicBool::new(false));
        let handle = listener.spawn(Arc::clone(&stop))?;
        handle.join().expect("listener thread panicked");

        assert!(!trigger.is_raised());
        Ok(())
    }

    #[test]
    fn scratch_wav_is_written_and_overwritten() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("command_audio.wav");

        write_scratch_wav(&path, &[0.0, 0.5, -0.5], 16_000)?;
        let first_len = std::fs::metadata(&path)?.len();

        write_scratch_wav(&path, &[0.0], 16_000)?;
        let second_len = std::fs::metadata(&path)?.len();

        assert!(first_len > second_len);
        Ok(())
    }
}
