//! Camera frame source.
//!
//! `CameraSource` hides the backing device behind one `next_frame` surface:
//! - `stub://...` devices produce synthetic frames (tests, bring-up)
//! - numeric strings ("0") and paths ("/dev/video0") open a V4L2 device
//!   when the `ingest-v4l2` feature is enabled
//!
//! The source never writes frames to disk and never retains a frame beyond
//! handoff to the caller.

use anyhow::Result;
#[cfg(feature = "ingest-v4l2")]
use anyhow::Context;
#[cfg(feature = "ingest-v4l2")]
use ouroboros::self_referencing;
#[cfg(feature = "ingest-v4l2")]
use std::time::{Duration, Instant};

use crate::config::CameraSettings;
use crate::frame::Frame;

/// Camera frame source with a synthetic fallback for `stub://` devices.
pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "ingest-v4l2")]
    V4l2(V4l2Camera),
}

impl CameraSource {
    pub fn new(settings: CameraSettings) -> Result<Self> {
        if settings.device.starts_with("stub://") {
            Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCamera::new(settings)),
            })
        } else {
            #[cfg(feature = "ingest-v4l2")]
            {
                Ok(Self {
                    backend: CameraBackend::V4l2(V4l2Camera::new(settings)?),
                })
            }
            #[cfg(not(feature = "ingest-v4l2"))]
            {
                anyhow::bail!(
                    "camera device {} requires the ingest-v4l2 feature",
                    settings.device
                )
            }
        }
    }

    /// Open the device. A failure here is process-fatal for the daemon.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.connect(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::V4l2(camera) => camera.connect(),
        }
    }

    /// Capture the next frame. Blocking; a failure is a transient fault the
    /// caller retries after a fixed backoff.
    pub fn next_frame(&mut self) -> Result<Frame> {
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.next_frame(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::V4l2(camera) => camera.next_frame(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            CameraBackend::Synthetic(camera) => camera.is_healthy(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::V4l2(camera) => camera.is_healthy(),
        }
    }

    pub fn stats(&self) -> CameraStats {
        match &self.backend {
            CameraBackend::Synthetic(camera) => camera.stats(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::V4l2(camera) => camera.stats(),
        }
    }
}

/// Capture statistics for health logging.
#[derive(Clone, Debug)]
pub struct CameraStats {
    pub frames_captured: u64,
    pub device: String,
}

// ----------------------------------------------------------------------------
// Synthetic camera (stub://) for tests
// ----------------------------------------------------------------------------

struct SyntheticCamera {
    settings: CameraSettings,
    frame_count: u64,
    /// Simulated "scene" state so consecutive frames are not identical.
    scene_state: u8,
}

impl SyntheticCamera {
    fn new(settings: CameraSettings) -> Self {
        Self {
            settings,
            frame_count: 0,
            scene_state: 0,
        }
    }

    fn connect(&mut self) -> Result<()> {
        log::info!(
            "CameraSource: connected to {} (synthetic)",
            self.settings.device
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        self.frame_count += 1;

        // Change scene state occasionally to simulate motion
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let pixel_count = (self.settings.width * self.settings.height * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }

        Frame::from_rgb(pixels, self.settings.width, self.settings.height)
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            device: self.settings.device.clone(),
        }
    }
}

// ----------------------------------------------------------------------------
// Production camera using libv4l
// ----------------------------------------------------------------------------

#[cfg(feature = "ingest-v4l2")]
struct V4l2Camera {
    settings: CameraSettings,
    state: Option<V4l2State>,
    frame_count: u64,
    last_frame_at: Option<Instant>,
    last_error: Option<String>,
    active_width: u32,
    active_height: u32,
}

#[cfg(feature = "ingest-v4l2")]
#[self_referencing]
struct V4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

#[cfg(feature = "ingest-v4l2")]
impl V4l2Camera {
    fn new(settings: CameraSettings) -> Result<Self> {
        Ok(Self {
            active_width: settings.width,
            active_height: settings.height,
            settings,
            state: None,
            frame_count: 0,
            last_frame_at: None,
            last_error: None,
        })
    }

    fn device_path(&self) -> String {
        // A bare index ("0") names /dev/videoN; anything else is a path.
        match self.settings.device.parse::<u32>() {
            Ok(index) => format!("/dev/video{}", index),
            Err(_) => self.settings.device.clone(),
        }
    }

    fn connect(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let path = self.device_path();
        let mut device =
            v4l::Device::with_path(&path).with_context(|| format!("open v4l2 device {}", path))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.settings.width;
        format.height = self.settings.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("CameraSource: failed to set format on {}: {}", path, err);
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        if self.settings.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.settings.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!("CameraSource: failed to set fps on {}: {}", path, err);
            }
        }

        self.active_width = format.width;
        self.active_height = format.height;
        self.last_error = None;

        let state = V4l2StateTryBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()
        .map_err(|err| {
            self.last_error = Some(err.to_string());
            err
        })?;
        self.state = Some(state);

        log::info!(
            "CameraSource: connected to {} ({}x{})",
            path,
            self.active_width,
            self.active_height
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("camera not connected")?;
        let (buf, _meta) = state
            .with_mut(|fields| fields.stream.next())
            .map_err(|err| {
                self.last_error = Some(err.to_string());
                anyhow::Error::new(err).context("capture camera frame")
            })?;

        self.frame_count += 1;
        self.last_frame_at = Some(Instant::now());

        Frame::from_rgb(buf.to_vec(), self.active_width, self.active_height)
    }

    fn is_healthy(&self) -> bool {
        if self.last_error.is_some() {
            return false;
        }
        let Some(last_frame_at) = self.last_frame_at else {
            return true;
        };
        last_frame_at.elapsed() <= self.health_grace()
    }

    fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            device: self.settings.device.clone(),
        }
    }

    fn health_grace(&self) -> Duration {
        let base_ms = if self.settings.target_fps == 0 {
            2_000
        } else {
            (1000 / self.settings.target_fps).saturating_mul(6)
        };
        Duration::from_millis(base_ms.max(2_000) as u64)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_settings() -> CameraSettings {
        CameraSettings {
            device: "stub://test".to_string(),
            width: 640,
            height: 480,
            target_fps: 10,
        }
    }

    #[test]
    fn synthetic_camera_produces_frames() -> Result<()> {
        let mut source = CameraSource::new(stub_settings())?;
        source.connect()?;

        let frame = source.next_frame()?;
        assert_eq!(frame.width, 640);
        assert_eq!(frame.height, 480);
        assert_eq!(frame.pixels().len(), 640 * 480 * 3);
        Ok(())
    }

    #[test]
    fn synthetic_camera_counts_frames() -> Result<()> {
        let mut source = CameraSource::new(stub_settings())?;
        source.connect()?;

        source.next_frame()?;
        source.next_frame()?;
        source.next_frame()?;

        let stats = source.stats();
        assert_eq!(stats.frames_captured, 3);
        assert!(source.is_healthy());
        Ok(())
    }
}
