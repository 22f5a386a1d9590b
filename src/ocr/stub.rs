use std::collections::VecDeque;

use anyhow::{anyhow, Result};

use crate::frame::Frame;
use crate::ocr::{TextRecognizer, TextSegment};

/// Stub recognizer for tests and stub deployments.
///
/// Plays back scripted per-call results; once the script runs out it reports
/// no text.
#[derive(Default)]
pub struct StubRecognizer {
    script: VecDeque<Result<Vec<TextSegment>, String>>,
}

impl StubRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_segments(&mut self, texts: &[&str]) -> &mut Self {
        let segments = texts
            .iter()
            .map(|text| TextSegment {
                text: (*text).to_string(),
                confidence: 0.9,
            })
            .collect();
        self.script.push_back(Ok(segments));
        self
    }

    pub fn push_failure(&mut self, message: &str) -> &mut Self {
        self.script.push_back(Err(message.to_string()));
        self
    }
}

impl TextRecognizer for StubRecognizer {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn recognize(&mut self, _frame: &Frame) -> Result<Vec<TextSegment>> {
        match self.script.pop_front() {
            Some(Ok(segments)) => Ok(segments),
            Some(Err(message)) => Err(anyhow!("stub recognizer failure: {}", message)),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_order_is_preserved() -> Result<()> {
        let frame = Frame::from_rgb(vec![0u8; 4 * 4 * 3], 4, 4)?;
        let mut recognizer = StubRecognizer::new();
        recognizer.push_segments(&["EXIT", "KEEP CLEAR"]);

        let segments = recognizer.recognize(&frame)?;
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "EXIT");
        assert_eq!(segments[1].text, "KEEP CLEAR");

        assert!(recognizer.recognize(&frame)?.is_empty());
        Ok(())
    }
}
