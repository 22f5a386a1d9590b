//! Frame ingestion sources.
//!
//! The camera is owned by exactly one component (the arbitration loop) and
//! produces `Frame` instances one at a time. A `stub://` device string
//! selects the synthetic source used in tests and stub deployments; real
//! V4L2 devices sit behind the `ingest-v4l2` feature.
//!
//! Failure policy is split: failing to *open* the camera is fatal for the
//! process (perception is the whole point), while a failed *read* of a single
//! frame is a transient fault the loop retries after a fixed backoff.

pub mod camera;

pub use camera::{CameraSource, CameraStats};
