//! End-to-end exercise of the perception pipeline with stub adapters:
//! synthetic camera frames flow through the arbiter while a real listener
//! thread raises the trigger flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use sightline::config::{AlertSettings, AudioSettings, CameraSettings, VoiceSettings};
use sightline::{
    Arbiter, CameraSource, Mode, StubDetector, StubRecognizer, StubSpeech, StubTranscriber,
    TriggerFlag, VoiceListener,
};

fn camera_settings() -> CameraSettings {
    CameraSettings {
        device: "stub://integration".to_string(),
        width: 640,
        height: 480,
        target_fps: 10,
    }
}

fn alert_settings() -> AlertSettings {
    AlertSettings {
        proximity_threshold: 0.45,
        speak_interval: Duration::from_secs(4),
        proximity_alert_interval: Duration::from_secs(1),
    }
}

#[test]
fn camera_frames_drive_detection_cycles() -> Result<()> {
    let mut camera = CameraSource::new(camera_settings())?;
    camera.connect()?;

    let speech = StubSpeech::new();
    let spoken = speech.utterances();
    let trigger = TriggerFlag::new();
    let mut arbiter = Arbiter::new(
        alert_settings(),
        Box::new(StubDetector::new()),
        Box::new(StubRecognizer::new()),
        Box::new(speech),
        trigger,
    );

    let base = Instant::now();
    for i in 0..10u64 {
        let frame = camera.next_frame()?;
        let report = arbiter.run_cycle(&frame, base + Duration::from_millis(i * 100))?;
        assert_eq!(report.mode, Mode::Detecting);
    }

    // Stub detector sees nothing: no speech over the whole run.
    assert!(spoken.lock().unwrap().is_empty());
    assert_eq!(camera.stats().frames_captured, 10);
    Ok(())
}

#[test]
fn voice_trigger_flows_from_listener_to_ocr_cycle() -> Result<()> {
    let mut camera = CameraSource::new(camera_settings())?;
    camera.connect()?;

    let trigger = TriggerFlag::new();
    let stop = Arc::new(AtomicBool::new(false));

    // Listener hears the command phrase on its second chunk.
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
        .push_transcript("background noise")
        .push_transcript("could you read this for me");
    let listener = VoiceListener::new(audio, voice, Box::new(transcriber), trigger.clone());
    let handle = listener.spawn(Arc::clone(&stop))?;

    let mut recognizer = StubRecognizer::new();
    recognizer.push_segments(&["CAUTION", "WET FLOOR"]);
    let speech = StubSpeech::new();
    let spoken = speech.utterances();
    let mut arbiter = Arbiter::new(
        alert_settings(),
        Box::new(StubDetector::new()),
        Box::new(recognizer),
        Box::new(speech),
        trigger.clone(),
    );

    // Run detection cycles until the listener's trigger lands.
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut read_cycle_seen = false;
    while Instant::now() < deadline {
        let frame = camera.next_frame()?;
        let report = arbiter.run_cycle(&frame, Instant::now())?;
        if report.mode == Mode::Reading {
            read_cycle_seen = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    stop.store(true, Ordering::SeqCst);
    handle.join().expect("listener thread panicked");

    assert!(read_cycle_seen, "voice trigger never reached the arbiter");
    let spoken = spoken.lock().unwrap();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0], "Reading: CAUTION WET FLOOR");
    Ok(())
}
