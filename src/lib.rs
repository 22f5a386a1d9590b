//! sightline - assistive perception daemon
//!
//! A real-time loop for wearable assistive devices: camera frames flow
//! through object detection, proximity alerts and scene narrations are
//! spoken aloud, and a voice command ("read this") triggers one-shot text
//! recognition of whatever is in front of the camera.
//!
//! Architecture, leaves first:
//! - adapters wrap the pretrained black boxes: detector ([`detect`]),
//!   speech-to-text ([`listen::transcribe`]), OCR ([`ocr`]), and
//!   text-to-speech ([`speech`]); each has a stub implementation and an
//!   optional feature-gated real backend
//! - [`ingest`] owns the camera and produces [`frame::Frame`]s
//! - [`listen`] runs the background voice-trigger thread, which signals the
//!   main loop through the one-shot [`trigger::TriggerFlag`]
//! - [`arbiter`] is the core: a single-threaded loop that, per frame,
//!   chooses between detection narration, a proximity danger alert, and
//!   OCR-on-demand, under rate-limit and priority rules
//!
//! Exactly two threads run: the arbitration loop and the voice listener.
//! The trigger flag is the only shared mutable state between them.

pub mod arbiter;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod listen;
pub mod ocr;
pub mod speech;
pub mod trigger;

pub use arbiter::{Arbiter, CycleReport, Mode};
pub use config::SightlineConfig;
pub use detect::{Detection, DetectorBackend, StubDetector};
pub use frame::Frame;
pub use ingest::CameraSource;
pub use listen::{StubTranscriber, Transcriber, VoiceListener};
pub use ocr::{StubRecognizer, TextRecognizer, TextSegment};
pub use speech::{SpeechEngine, StubSpeech};
pub use trigger::TriggerFlag;
