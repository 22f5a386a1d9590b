use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::Frame;

/// Object detector backend.
///
/// Implementations wrap pretrained models; the loop treats them as opaque
/// "frame in, labeled boxes out" capabilities. Coordinates are in frame pixel
/// space. Backends must not retain the frame beyond the `detect` call.
pub trait DetectorBackend: Send {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;

    /// Optional warm-up hook, run once before the loop starts.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
