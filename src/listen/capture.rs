//! Microphone capture.
//!
//! Chunked blocking capture for the voice-trigger listener: each call to
//! `record` returns one fixed-duration buffer of mono f32 samples. A
//! `stub://` device selects a synthetic silent microphone for tests and
//! mic-less deployments.
//!
//! cpal streams are not `Send`, so an `AudioCapture` must be created on the
//! thread that uses it; the listener opens its own capture after spawning.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};

use crate::config::AudioSettings;

pub struct AudioCapture {
    backend: CaptureBackend,
    sample_rate: u32,
}

enum CaptureBackend {
    Synthetic,
    Cpal(CpalCapture),
}

impl AudioCapture {
    /// Open the configured input device. A failure here is persistent and
    /// disables the voice listener; the caller must not retry in a loop.
    pub fn open(settings: &AudioSettings) -> Result<Self> {
        let backend = if settings.device.starts_with("stub://") {
            log::info!("AudioCapture: using synthetic microphone {}", settings.device);
            CaptureBackend::Synthetic
        } else {
            CaptureBackend::Cpal(CpalCapture::open(settings)?)
        };
        Ok(Self {
            backend,
            sample_rate: settings.sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Capture one chunk of the given duration. Blocks for the full duration.
    pub fn record(&mut self, duration: Duration) -> Result<Vec<f32>> {
        match &mut self.backend {
            CaptureBackend::Synthetic => {
                // Mimic a blocking device read so the listener paces itself.
                std::thread::sleep(duration);
                let samples = (self.sample_rate as f64 * duration.as_secs_f64()) as usize;
                Ok(vec![0.0; samples])
            }
            CaptureBackend::Cpal(capture) => capture.record(duration),
        }
    }
}

// ----------------------------------------------------------------------------
// Real microphone via cpal
// ----------------------------------------------------------------------------

struct CpalCapture {
    // Held to keep the input stream alive; samples arrive via the callback.
    _stream: Stream,
    buffer: Arc<Mutex<Vec<f32>>>,
    channels: u16,
}

impl CpalCapture {
    fn open(settings: &AudioSettings) -> Result<Self> {
        let host = cpal::default_host();

        let device = if settings.device == "default" {
            host.default_input_device()
                .ok_or_else(|| anyhow!("no default input device available"))?
        } else {
            host.input_devices()
                .context("failed to enumerate input devices")?
                .find(|d| {
                    d.name()
                        .map(|name| name.contains(&settings.device))
                        .unwrap_or(false)
                })
                .ok_or_else(|| anyhow!("no input device matching '{}'", settings.device))?
        };

        let supported = device
            .supported_input_configs()
            .context("failed to query input configs")?
            .find(|c| {
                c.channels() == settings.channels
                    && c.min_sample_rate() <= SampleRate(settings.sample_rate)
                    && c.max_sample_rate() >= SampleRate(settings.sample_rate)
            })
            .ok_or_else(|| {
                anyhow!(
                    "device does not support {} ch @ {} Hz",
                    settings.channels,
                    settings.sample_rate
                )
            })?;
        let config: StreamConfig = supported
            .with_sample_rate(SampleRate(settings.sample_rate))
            .config();

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let callback_buffer = Arc::clone(&buffer);
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = callback_buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    log::error!("audio capture stream error: {}", err);
                },
                None,
            )
            .context("failed to build input stream")?;
        stream.play().context("failed to start input stream")?;

        log::info!(
            "AudioCapture: opened {} ({} ch @ {} Hz)",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            settings.channels,
            settings.sample_rate
        );

        Ok(Self {
            _stream: stream,
            buffer,
            channels: settings.channels,
        })
    }

    fn record(&mut self, duration: Duration) -> Result<Vec<f32>> {
        {
            let mut buf = self
                .buffer
                .lock()
                .map_err(|_| anyhow!("capture buffer poisoned"))?;
            buf.clear();
        }

        std::thread::sleep(duration);

        let raw = {
            let mut buf = self
                .buffer
                .lock()
                .map_err(|_| anyhow!("capture buffer poisoned"))?;
            std::mem::take(&mut *buf)
        };

        if raw.is_empty() {
            return Err(anyhow!("no samples captured; input stream stalled"));
        }

        Ok(downmix(&raw, self.channels))
    }
}

/// Average interleaved channels into mono. Transcribers expect mono input.
fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_channels() {
        let stereo = [0.0, 1.0, 0.5, 0.5];
        assert_eq!(downmix(&stereo, 2), vec![0.5, 0.5]);
    }

    #[test]
    fn mono_passes_through() {
        let mono = [0.1, 0.2, 0.3];
        assert_eq!(downmix(&mono, 1), mono.to_vec());
    }

    #[test]
    fn synthetic_capture_yields_expected_length() -> Result<()> {
        let settings = AudioSettings {
            device: "stub://silence".to_string(),
            sample_rate: 16_000,
            channels: 1,
            record_duration: Duration::from_millis(10),
            scratch_wav: None,
        };
        let mut capture = AudioCapture::open(&settings)?;
        let samples = capture.record(Duration::from_millis(10))?;
        assert_eq!(samples.len(), 160);
        assert!(samples.iter().all(|s| *s == 0.0));
        Ok(())
    }
}
