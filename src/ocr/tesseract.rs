#![cfg(feature = "ocr-leptess")]

use anyhow::{Context, Result};
use leptess::LepTess;

use crate::frame::Frame;
use crate::ocr::{TextRecognizer, TextSegment};

/// Tesseract-backed recognizer via leptess.
///
/// Frames are grayscaled and re-encoded as PNG in memory for Leptonica;
/// nothing touches disk. Tesseract reports one aggregate segment per call
/// with its mean word confidence.
pub struct TesseractRecognizer {
    engine: LepTess,
}

impl TesseractRecognizer {
    /// Initialize with a language code (e.g. "eng"). `datapath` of None uses
    /// the system tessdata directory.
    pub fn new(datapath: Option<&str>, language: &str) -> Result<Self> {
        let engine =
            LepTess::new(datapath, language).context("failed to initialize tesseract")?;
        Ok(Self { engine })
    }

    fn encode_gray_png(frame: &Frame) -> Result<Vec<u8>> {
        let gray = frame.to_grayscale();
        let mut png = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png);
        image::ImageEncoder::write_image(
            encoder,
            &gray,
            frame.width,
            frame.height,
            image::ExtendedColorType::L8,
        )
        .context("failed to encode frame for OCR")?;
        Ok(png)
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&mut self, frame: &Frame) -> Result<Vec<TextSegment>> {
        let png = Self::encode_gray_png(frame)?;
        self.engine
            .set_image_from_mem(&png)
            .context("failed to hand frame to tesseract")?;

        let text = self
            .engine
            .get_utf8_text()
            .context("tesseract text extraction failed")?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let confidence = (self.engine.mean_text_conf().max(0) as f32) / 100.0;
        Ok(vec![TextSegment {
            text: text.to_string(),
            confidence,
        }])
    }
}
