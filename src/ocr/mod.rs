//! On-demand text recognition.
//!
//! OCR runs only in a READING cycle, triggered by the voice command. The
//! recognizer is a black-box capability: grayscale frame in, text segments
//! out. Segment order is undefined across calls but stable within one call;
//! the arbiter concatenates segments in the order returned.

mod stub;
#[cfg(feature = "ocr-leptess")]
mod tesseract;

pub use stub::StubRecognizer;
#[cfg(feature = "ocr-leptess")]
pub use tesseract::TesseractRecognizer;

use anyhow::Result;

use crate::frame::Frame;

/// One recognized text region.
#[derive(Clone, Debug)]
pub struct TextSegment {
    pub text: String,
    /// Recognizer confidence in 0..1.
    pub confidence: f32,
}

/// Text recognition backend.
pub trait TextRecognizer: Send {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Recognize text in a frame. An empty vec means "no text found" and is
    /// not an error.
    fn recognize(&mut self, frame: &Frame) -> Result<Vec<TextSegment>>;
}
