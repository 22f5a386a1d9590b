use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CAMERA_DEVICE: &str = "stub://front";
const DEFAULT_FRAME_WIDTH: u32 = 640;
const DEFAULT_FRAME_HEIGHT: u32 = 480;
const DEFAULT_TARGET_FPS: u32 = 10;
const DEFAULT_MIC_DEVICE: &str = "default";
const DEFAULT_SAMPLE_RATE: u32 = 16_000;
const DEFAULT_CHANNELS: u16 = 1;
const DEFAULT_RECORD_SECONDS: f64 = 3.0;
const DEFAULT_COMMAND_PHRASE: &str = "read this";
const DEFAULT_COOLDOWN_SECONDS: f64 = 5.0;
const DEFAULT_PROXIMITY_THRESHOLD: f32 = 0.45;
const DEFAULT_SPEAK_INTERVAL_SECONDS: f64 = 4.0;
const DEFAULT_PROXIMITY_ALERT_INTERVAL_SECONDS: f64 = 1.0;

#[derive(Debug, Deserialize, Default)]
struct SightlineConfigFile {
    camera: Option<CameraConfigFile>,
    audio: Option<AudioConfigFile>,
    voice: Option<VoiceConfigFile>,
    alerts: Option<AlertConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct AudioConfigFile {
    device: Option<String>,
    sample_rate: Option<u32>,
    channels: Option<u16>,
    record_seconds: Option<f64>,
    scratch_wav: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct VoiceConfigFile {
    command_phrase: Option<String>,
    cooldown_seconds: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct AlertConfigFile {
    proximity_threshold: Option<f32>,
    speak_interval_seconds: Option<f64>,
    proximity_alert_interval_seconds: Option<f64>,
}

/// Resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct SightlineConfig {
    pub camera: CameraSettings,
    pub audio: AudioSettings,
    pub voice: VoiceSettings,
    pub alerts: AlertSettings,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Device path ("/dev/video0"), numeric index ("0"), or "stub://..." for
    /// the synthetic source.
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

#[derive(Debug, Clone)]
pub struct AudioSettings {
    /// Input device name, "default", or "stub://..." for the synthetic mic.
    pub device: String,
    pub sample_rate: u32,
    pub channels: u16,
    /// Length of each listener capture chunk.
    pub record_duration: Duration,
    /// Scratch WAV path, overwritten every listener cycle. None disables the
    /// scratch file.
    pub scratch_wav: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct VoiceSettings {
    /// Lowercased command phrase, matched by substring against case-folded
    /// transcripts.
    pub command_phrase: String,
    /// Suppression window after a recognized command.
    pub cooldown: Duration,
}

#[derive(Debug, Clone)]
pub struct AlertSettings {
    /// Bounding-box height ratio (0..1) above which the danger path fires.
    pub proximity_threshold: f32,
    /// Minimum gap between standard narrations.
    pub speak_interval: Duration,
    /// Minimum gap between danger alerts.
    pub proximity_alert_interval: Duration,
}

impl SightlineConfig {
    /// Load configuration: optional JSON file named by `SIGHTLINE_CONFIG`,
    /// then env overrides, then validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SIGHTLINE_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Load from an explicit file path (or defaults when None), still applying
    /// env overrides and validation.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SightlineConfigFile) -> Self {
        let camera = CameraSettings {
            device: file
                .camera
                .as_ref()
                .and_then(|camera| camera.device.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_DEVICE.to_string()),
            width: file
                .camera
                .as_ref()
                .and_then(|camera| camera.width)
                .unwrap_or(DEFAULT_FRAME_WIDTH),
            height: file
                .camera
                .as_ref()
                .and_then(|camera| camera.height)
                .unwrap_or(DEFAULT_FRAME_HEIGHT),
            target_fps: file
                .camera
                .as_ref()
                .and_then(|camera| camera.target_fps)
                .unwrap_or(DEFAULT_TARGET_FPS),
        };
        let audio = AudioSettings {
            device: file
                .audio
                .as_ref()
                .and_then(|audio| audio.device.clone())
                .unwrap_or_else(|| DEFAULT_MIC_DEVICE.to_string()),
            sample_rate: file
                .audio
                .as_ref()
                .and_then(|audio| audio.sample_rate)
                .unwrap_or(DEFAULT_SAMPLE_RATE),
            channels: file
                .audio
                .as_ref()
                .and_then(|audio| audio.channels)
                .unwrap_or(DEFAULT_CHANNELS),
            record_duration: secs(
                file.audio
                    .as_ref()
                    .and_then(|audio| audio.record_seconds)
                    .unwrap_or(DEFAULT_RECORD_SECONDS),
            ),
            scratch_wav: file.audio.and_then(|audio| audio.scratch_wav),
        };
        let voice = VoiceSettings {
            command_phrase: file
                .voice
                .as_ref()
                .and_then(|voice| voice.command_phrase.clone())
                .unwrap_or_else(|| DEFAULT_COMMAND_PHRASE.to_string()),
            cooldown: secs(
                file.voice
                    .as_ref()
                    .and_then(|voice| voice.cooldown_seconds)
                    .unwrap_or(DEFAULT_COOLDOWN_SECONDS),
            ),
        };
        let alerts = AlertSettings {
            proximity_threshold: file
                .alerts
                .as_ref()
                .and_then(|alerts| alerts.proximity_threshold)
                .unwrap_or(DEFAULT_PROXIMITY_THRESHOLD),
            speak_interval: secs(
                file.alerts
                    .as_ref()
                    .and_then(|alerts| alerts.speak_interval_seconds)
                    .unwrap_or(DEFAULT_SPEAK_INTERVAL_SECONDS),
            ),
            proximity_alert_interval: secs(
                file.alerts
                    .as_ref()
                    .and_then(|alerts| alerts.proximity_alert_interval_seconds)
                    .unwrap_or(DEFAULT_PROXIMITY_ALERT_INTERVAL_SECONDS),
            ),
        };
        Self {
            camera,
            audio,
            voice,
            alerts,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("SIGHTLINE_CAMERA_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(device) = std::env::var("SIGHTLINE_MIC_DEVICE") {
            if !device.trim().is_empty() {
                self.audio.device = device;
            }
        }
        if let Ok(phrase) = std::env::var("SIGHTLINE_COMMAND_PHRASE") {
            if !phrase.trim().is_empty() {
                self.voice.command_phrase = phrase;
            }
        }
        if let Ok(threshold) = std::env::var("SIGHTLINE_PROXIMITY_THRESHOLD") {
            self.alerts.proximity_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("SIGHTLINE_PROXIMITY_THRESHOLD must be a number"))?;
        }
        if let Ok(secs) = std::env::var("SIGHTLINE_SPEAK_INTERVAL_SECS") {
            self.alerts.speak_interval = parse_secs("SIGHTLINE_SPEAK_INTERVAL_SECS", &secs)?;
        }
        if let Ok(secs) = std::env::var("SIGHTLINE_PROXIMITY_ALERT_INTERVAL_SECS") {
            self.alerts.proximity_alert_interval =
                parse_secs("SIGHTLINE_PROXIMITY_ALERT_INTERVAL_SECS", &secs)?;
        }
        if let Ok(path) = std::env::var("SIGHTLINE_SCRATCH_WAV") {
            if !path.trim().is_empty() {
                self.audio.scratch_wav = Some(PathBuf::from(path));
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        if !(self.alerts.proximity_threshold > 0.0 && self.alerts.proximity_threshold < 1.0) {
            return Err(anyhow!(
                "proximity_threshold must be a fraction between 0 and 1, got {}",
                self.alerts.proximity_threshold
            ));
        }
        if self.audio.sample_rate == 0 {
            return Err(anyhow!("audio sample_rate must be non-zero"));
        }
        if self.audio.channels == 0 {
            return Err(anyhow!("audio channels must be non-zero"));
        }
        if self.audio.record_duration.is_zero() {
            return Err(anyhow!("record_seconds must be greater than zero"));
        }
        let phrase = self.voice.command_phrase.trim().to_lowercase();
        if phrase.is_empty() {
            return Err(anyhow!("command_phrase must not be empty"));
        }
        self.voice.command_phrase = phrase;
        Ok(())
    }
}

impl Default for SightlineConfig {
    fn default() -> Self {
        Self::from_file(SightlineConfigFile::default())
    }
}

fn read_config_file(path: &Path) -> Result<SightlineConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

/// Clamp file-supplied seconds to non-negative before conversion; range
/// errors are reported by `validate`.
fn secs(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    let secs: f64 = value
        .parse()
        .map_err(|_| anyhow!("{} must be a number of seconds", key))?;
    if !(secs.is_finite() && secs >= 0.0) {
        return Err(anyhow!("{} must be a non-negative number of seconds", key));
    }
    Ok(Duration::from_secs_f64(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let cfg = SightlineConfig::default();
        assert_eq!(cfg.camera.width, 640);
        assert_eq!(cfg.camera.height, 480);
        assert_eq!(cfg.voice.command_phrase, "read this");
        assert!((cfg.alerts.proximity_threshold - 0.45).abs() < f32::EPSILON);
        assert_eq!(cfg.alerts.speak_interval, Duration::from_secs(4));
        assert_eq!(cfg.alerts.proximity_alert_interval, Duration::from_secs(1));
        assert_eq!(cfg.audio.sample_rate, 16_000);
        assert_eq!(cfg.audio.channels, 1);
    }

    #[test]
    fn validate_lowercases_phrase() -> Result<()> {
        let mut cfg = SightlineConfig::default();
        cfg.voice.command_phrase = "  Read This ".to_string();
        cfg.validate()?;
        assert_eq!(cfg.voice.command_phrase, "read this");
        Ok(())
    }

    #[test]
    fn validate_rejects_threshold_out_of_range() {
        let mut cfg = SightlineConfig::default();
        cfg.alerts.proximity_threshold = 1.2;
        assert!(cfg.validate().is_err());
    }
}
