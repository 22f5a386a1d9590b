use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use sightline::config::SightlineConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "SIGHTLINE_CONFIG",
        "SIGHTLINE_CAMERA_DEVICE",
        "SIGHTLINE_MIC_DEVICE",
        "SIGHTLINE_COMMAND_PHRASE",
        "SIGHTLINE_PROXIMITY_THRESHOLD",
        "SIGHTLINE_SPEAK_INTERVAL_SECS",
        "SIGHTLINE_PROXIMITY_ALERT_INTERVAL_SECS",
        "SIGHTLINE_SCRATCH_WAV",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "camera": {
            "device": "/dev/video2",
            "width": 800,
            "height": 600,
            "target_fps": 15
        },
        "audio": {
            "device": "USB Microphone",
            "sample_rate": 16000,
            "channels": 1,
            "record_seconds": 2.5,
            "scratch_wav": "/tmp/command_audio.wav"
        },
        "voice": {
            "command_phrase": "Read This",
            "cooldown_seconds": 6.0
        },
        "alerts": {
            "proximity_threshold": 0.5,
            "speak_interval_seconds": 3.0,
            "proximity_alert_interval_seconds": 2.0
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("SIGHTLINE_CONFIG", file.path());
    std::env::set_var("SIGHTLINE_CAMERA_DEVICE", "stub://override");
    std::env::set_var("SIGHTLINE_PROXIMITY_THRESHOLD", "0.6");

    let cfg = SightlineConfig::load().expect("load config");

    // Env wins over file.
    assert_eq!(cfg.camera.device, "stub://override");
    assert!((cfg.alerts.proximity_threshold - 0.6).abs() < f32::EPSILON);

    // File wins over defaults.
    assert_eq!(cfg.camera.width, 800);
    assert_eq!(cfg.camera.height, 600);
    assert_eq!(cfg.camera.target_fps, 15);
    assert_eq!(cfg.audio.device, "USB Microphone");
    assert_eq!(cfg.audio.record_duration, Duration::from_secs_f64(2.5));
    assert_eq!(
        cfg.audio.scratch_wav.as_deref(),
        Some(std::path::Path::new("/tmp/command_audio.wav"))
    );
    assert_eq!(cfg.voice.cooldown, Duration::from_secs_f64(6.0));
    assert_eq!(cfg.alerts.speak_interval, Duration::from_secs_f64(3.0));

    // Validation lowercases the phrase.
    assert_eq!(cfg.voice.command_phrase, "read this");

    clear_env();
}

#[test]
fn defaults_apply_without_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = SightlineConfig::load().expect("load defaults");
    assert_eq!(cfg.camera.width, 640);
    assert_eq!(cfg.camera.height, 480);
    assert_eq!(cfg.voice.command_phrase, "read this");
    assert_eq!(cfg.alerts.speak_interval, Duration::from_secs(4));
    assert_eq!(cfg.alerts.proximity_alert_interval, Duration::from_secs(1));

    clear_env();
}

#[test]
fn rejects_invalid_threshold_from_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("SIGHTLINE_PROXIMITY_THRESHOLD", "1.5");
    assert!(SightlineConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_empty_command_phrase() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{ "voice": { "command_phrase": "   " } }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    std::env::set_var("SIGHTLINE_CONFIG", file.path());

    assert!(SightlineConfig::load().is_err());

    clear_env();
}
