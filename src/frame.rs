//! Camera frame container.
//!
//! Frames are plain RGB buffers produced by the ingestion layer and consumed
//! by detector and OCR backends within a single arbitration cycle. Nothing
//! retains a frame across cycles.

use anyhow::{anyhow, Result};

/// One captured frame, 8-bit RGB, row-major.
#[derive(Clone)]
pub struct Frame {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Wrap an RGB buffer. Fails when the buffer length does not match the
    /// declared dimensions.
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "RGB frame length mismatch: expected {} bytes for {}x{}, got {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Single-channel luma conversion (BT.601 integer weights), used to feed
    /// OCR backends that expect grayscale input.
    pub fn to_grayscale(&self) -> Vec<u8> {
        self.pixels
            .chunks_exact(3)
            .map(|px| {
                let r = px[0] as u32;
                let g = px[1] as u32;
                let b = px[2] as u32;
                ((r * 299 + g * 587 + b * 114) / 1000) as u8
            })
            .collect()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(Frame::from_rgb(vec![0u8; 10], 4, 4).is_err());
    }

    #[test]
    fn grayscale_has_one_byte_per_pixel() -> Result<()> {
        let frame = Frame::from_rgb(vec![128u8; 4 * 4 * 3], 4, 4)?;
        let gray = frame.to_grayscale();
        assert_eq!(gray.len(), 16);
        assert_eq!(gray[0], 128);
        Ok(())
    }
}
