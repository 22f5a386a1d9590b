use std::collections::VecDeque;

use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::frame::Frame;

/// Stub detector for tests and stub deployments.
///
/// Plays back a scripted sequence of per-frame detection sets; once the
/// script runs out it returns empty frames. An entry can also be a failure,
/// to exercise the adapter-fault path.
#[derive(Default)]
pub struct StubDetector {
    script: VecDeque<Result<Vec<Detection>, String>>,
}

impl StubDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame's worth of detections.
    pub fn push_frame(&mut self, detections: Vec<Detection>) -> &mut Self {
        self.script.push_back(Ok(detections));
        self
    }

    /// Queue a detection failure.
    pub fn push_failure(&mut self, message: &str) -> &mut Self {
        self.script.push_back(Err(message.to_string()));
        self
    }
}

impl DetectorBackend for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        match self.script.pop_front() {
            Some(Ok(detections)) => Ok(detections),
            Some(Err(message)) => Err(anyhow!("stub detector failure: {}", message)),
            None => Ok(Vec::new()),
        }
    }
}
