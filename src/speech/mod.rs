//! Speech output.
//!
//! Speech is synchronous and mutually exclusive: `speak` blocks until
//! playback completes, and the arbiter owns the engine, so utterances can
//! never overlap. Stalling perception during speech is deliberate; it keeps
//! alerts from being garbled at the cost of a few dropped frames.

mod stub;
#[cfg(feature = "speech-native")]
mod native;

pub use stub::{StubSpeech, UtteranceLog};
#[cfg(feature = "speech-native")]
pub use native::NativeSpeech;

use anyhow::Result;

/// Text-to-speech backend.
pub trait SpeechEngine: Send {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Speak the text, blocking until audio playback finishes.
    fn speak(&mut self, text: &str) -> Result<()>;
}
