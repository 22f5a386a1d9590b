use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::speech::SpeechEngine;

/// Shared record of everything a `StubSpeech` engine has spoken.
pub type UtteranceLog = Arc<Mutex<Vec<String>>>;

/// Stub engine that records utterances instead of playing audio.
///
/// The default engine in stub deployments, and the observation point for
/// arbitration tests: clone the log before handing the engine to the
/// arbiter.
#[derive(Default)]
pub struct StubSpeech {
    log: UtteranceLog,
    failing: bool,
}

impl StubSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the utterance record shared with this engine.
    pub fn utterances(&self) -> UtteranceLog {
        Arc::clone(&self.log)
    }

    /// Make every subsequent `speak` call fail, to exercise the cycle fault
    /// path.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }
}

impl SpeechEngine for StubSpeech {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        if self.failing {
            return Err(anyhow!("stub speech failure"));
        }
        log::info!("speak: {}", text);
        self.log
            .lock()
            .map_err(|_| anyhow!("utterance log poisoned"))?
            .push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_utterances_in_order() -> Result<()> {
        let mut engine = StubSpeech::new();
        let log = engine.utterances();

        engine.speak("first")?;
        engine.speak("second")?;

        let spoken = log.lock().unwrap();
        assert_eq!(spoken.as_slice(), ["first", "second"]);
        Ok(())
    }

    #[test]
    fn failing_mode_returns_errors() {
        let mut engine = StubSpeech::new();
        engine.set_failing(true);
        assert!(engine.speak("anything").is_err());
    }
}
