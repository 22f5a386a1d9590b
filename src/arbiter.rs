//! Multi-modal event arbitration.
//!
//! The arbitration loop is the only internal logic in the system: once per
//! frame it chooses exactly one of two mutually exclusive actions. Either it
//! consumes a pending voice trigger and runs one OCR cycle (READING), or it
//! runs real-time detection and applies the alert priority rules (DETECTING).
//! READING is never sticky: the cycle after an OCR read always returns to
//! detection, even when text was found.
//!
//! Alert priority within a detection cycle:
//! 1. proximity alert, gated by `proximity_alert_interval` — suppresses the
//!    narration branch for the whole cycle
//! 2. object narration, gated by `speak_interval` and by the absence of a
//!    proximity condition
//! 3. silence
//!
//! Speech is issued synchronously through the owned `SpeechEngine`, so
//! utterances are serialized by construction. Rate-limit timers are stamped
//! at issuance. Both timers are owned here and never shared.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::config::AlertSettings;
use crate::detect::{any_proximate, label_set, DetectorBackend};
use crate::frame::Frame;
use crate::ingest::CameraSource;
use crate::ocr::TextRecognizer;
use crate::speech::SpeechEngine;
use crate::trigger::TriggerFlag;

/// Backoff after a failed frame read.
const FRAME_RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Backoff after an unexpected in-cycle fault.
const CYCLE_FAULT_BACKOFF: Duration = Duration::from_secs(5);

/// Pause after an OCR cycle before resuming real-time detection.
const POST_READ_SETTLE: Duration = Duration::from_secs(1);

/// Interval between camera health log lines.
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

const DANGER_UTTERANCE: &str = "DANGER! Obstacle right in front!";
const NO_TEXT_UTTERANCE: &str = "No text detected.";

/// Loop state. Both states are transient: READING lasts exactly one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Detecting,
    Reading,
}

/// What one cycle did, for logging and tests.
#[derive(Clone, Debug)]
pub struct CycleReport {
    /// Mode the cycle ran in.
    pub mode: Mode,
    /// Whether any box exceeded the proximity threshold (detection cycles).
    pub proximity: bool,
    /// The utterance issued this cycle, if any.
    pub spoke: Option<String>,
}

pub struct Arbiter {
    alerts: AlertSettings,
    detector: Box<dyn DetectorBackend>,
    recognizer: Box<dyn TextRecognizer>,
    speech: Box<dyn SpeechEngine>,
    trigger: TriggerFlag,
    mode: Mode,
    last_spoken: Option<Instant>,
    last_proximity_alert: Option<Instant>,
}

impl Arbiter {
    pub fn new(
        alerts: AlertSettings,
        detector: Box<dyn DetectorBackend>,
        recognizer: Box<dyn TextRecognizer>,
        speech: Box<dyn SpeechEngine>,
        trigger: TriggerFlag,
    ) -> Self {
        Self {
            alerts,
            detector,
            recognizer,
            speech,
            trigger,
            mode: Mode::Detecting,
            last_spoken: None,
            last_proximity_alert: None,
        }
    }

    /// Run the loop until the stop flag is raised. Frame-read failures and
    /// in-cycle faults are transient: log, back off, continue.
    pub fn run(&mut self, source: &mut CameraSource, target_fps: u32, stop: &AtomicBool) -> Result<()> {
        self.detector
            .warm_up()
            .context("detector warm-up failed")?;

        let frame_interval = if target_fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(1000 / target_fps as u64)
        };
        let mut last_health_log = Instant::now();

        log::info!(
            "arbitration loop running: detector={} ocr={} speech={}",
            self.detector.name(),
            self.recognizer.name(),
            self.speech.name()
        );

        while !stop.load(Ordering::SeqCst) {
            let frame = match source.next_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!(
                        "frame read failed: {:#}; retrying in {:?}",
                        e,
                        FRAME_RETRY_BACKOFF
                    );
                    std::thread::sleep(FRAME_RETRY_BACKOFF);
                    continue;
                }
            };

            let report = match self.run_cycle(&frame, Instant::now()) {
                Ok(report) => report,
                Err(e) => {
                    log::error!("cycle fault: {:#}; continuing after backoff", e);
                    std::thread::sleep(CYCLE_FAULT_BACKOFF);
                    continue;
                }
            };

            if let Some(utterance) = &report.spoke {
                log::debug!("spoke ({:?}): {}", report.mode, utterance);
            }
            if report.mode == Mode::Reading {
                // Small pause before resuming vision, as in the reference
                // deployment.
                std::thread::sleep(POST_READ_SETTLE);
            }

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                let stats = source.stats();
                log::info!(
                    "camera health={} frames={} device={}",
                    source.is_healthy(),
                    stats.frames_captured,
                    stats.device
                );
                last_health_log = Instant::now();
            }

            std::thread::sleep(frame_interval);
        }

        log::info!("arbitration loop stopped");
        Ok(())
    }

    /// Execute exactly one cycle against an already-captured frame.
    ///
    /// `now` is passed in rather than sampled so the rate-limit rules are
    /// testable; `run` supplies `Instant::now()`.
    pub fn run_cycle(&mut self, frame: &Frame, now: Instant) -> Result<CycleReport> {
        // Consume a pending trigger: one OCR cycle, then back to detection.
        // A trigger raised while this cycle runs is honored next cycle.
        if self.trigger.take() {
            self.mode = Mode::Reading;
        }

        match self.mode {
            Mode::Reading => {
                let report = self.read_cycle(frame, now);
                self.mode = Mode::Detecting;
                report
            }
            Mode::Detecting => self.detect_cycle(frame, now),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn read_cycle(&mut self, frame: &Frame, now: Instant) -> Result<CycleReport> {
        log::info!("running on-demand text recognition");

        let segments = match self.recognizer.recognize(frame) {
            Ok(segments) => segments,
            Err(e) => {
                // Adapter fault, not an empty scan: stay silent this cycle
                // rather than falsely reporting "no text".
                log::warn!("text recognition failed: {:#}", e);
                return Ok(CycleReport {
                    mode: Mode::Reading,
                    proximity: false,
                    spoke: None,
                });
            }
        };

        let utterance = if segments.is_empty() {
            NO_TEXT_UTTERANCE.to_string()
        } else {
            let text: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
            format!("Reading: {}", text.join(" "))
        };

        self.speak_narration(&utterance, now)?;
        Ok(CycleReport {
            mode: Mode::Reading,
            proximity: false,
            spoke: Some(utterance),
        })
    }

    fn detect_cycle(&mut self, frame: &Frame, now: Instant) -> Result<CycleReport> {
        let detections = match self.detector.detect(frame) {
            Ok(detections) => detections,
            Err(e) => {
                // Adapter fault counts as "no detections this cycle".
                log::warn!("detection failed: {:#}", e);
                Vec::new()
            }
        };

        let labels = label_set(&detections);
        let proximity = any_proximate(&detections, frame.height, self.alerts.proximity_threshold);

        let mut spoke = None;
        if proximity && interval_elapsed(self.last_proximity_alert, now, self.alerts.proximity_alert_interval) {
            // Danger wins outright: the narration branch is suppressed this
            // cycle even when its own interval has elapsed.
            self.speak_alert(DANGER_UTTERANCE, now)?;
            log::warn!("proximity alert issued");
            spoke = Some(DANGER_UTTERANCE.to_string());
        } else if !labels.is_empty()
            && !proximity
            && interval_elapsed(self.last_spoken, now, self.alerts.speak_interval)
        {
            let narration = format!(
                "Detected: {}",
                labels.iter().cloned().collect::<Vec<_>>().join(", ")
            );
            self.speak_narration(&narration, now)?;
            log::info!("narration issued: {}", narration);
            spoke = Some(narration);
        }

        Ok(CycleReport {
            mode: Mode::Detecting,
            proximity,
            spoke,
        })
    }

    /// Speak through the standard path, stamping the narration timer at
    /// issuance.
    fn speak_narration(&mut self, text: &str, now: Instant) -> Result<()> {
        self.last_spoken = Some(now);
        self.speech.speak(text).context("speech output failed")
    }

    /// Speak through the alert path, stamping the danger timer at issuance.
    fn speak_alert(&mut self, text: &str, now: Instant) -> Result<()> {
        self.last_proximity_alert = Some(now);
        self.speech.speak(text).context("speech output failed")
    }
}

/// Strictly-greater gate: an alert at exactly the interval boundary is still
/// suppressed. `None` means "never issued", so the first alert always passes.
fn interval_elapsed(last: Option<Instant>, now: Instant, interval: Duration) -> bool {
    match last {
        Some(last) => now.saturating_duration_since(last) > interval,
        None => true,
    }
}
