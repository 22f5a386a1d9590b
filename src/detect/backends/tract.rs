#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::frame::Frame;

/// COCO class names, in the order YOLOv8 models emit them.
const COCO_LABELS: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const NMS_IOU_THRESHOLD: f32 = 0.45;

/// Tract-based detector running a YOLOv8-style ONNX model.
///
/// The model is loaded once at startup and run on RGB frames. Output is
/// expected in the exported YOLOv8 layout: one tensor shaped
/// `[1, 4 + num_classes, num_anchors]` with pixel-space `cx, cy, w, h` rows
/// followed by per-class scores.
pub struct TractDetector {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    width: u32,
    height: u32,
    confidence_threshold: f32,
}

impl TractDetector {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            width,
            height,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        })
    }

    /// Override the default confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    fn build_input(&self, frame: &Frame) -> Result<Tensor> {
        if frame.width != self.width || frame.height != self.height {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                frame.width,
                frame.height,
                self.width,
                self.height
            ));
        }

        let pixels = frame.pixels();
        let width = frame.width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, frame.height as usize, width),
            |(_, channel, y, x)| {
                let idx = (y * width + x) * 3 + channel;
                pixels[idx] as f32 / 255.0
            },
        );

        Ok(input.into_tensor())
    }

    fn decode(&self, outputs: TVec<TValue>) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let shape = view.shape();
        if shape.len() != 3 || shape[0] != 1 || shape[1] < 5 {
            return Err(anyhow!("unexpected model output shape {:?}", shape));
        }
        let num_classes = shape[1] - 4;
        let num_anchors = shape[2];

        let mut candidates = Vec::new();
        for anchor in 0..num_anchors {
            let mut best_class = 0usize;
            let mut best_score = 0.0f32;
            for class in 0..num_classes {
                let score = view[[0, 4 + class, anchor]];
                if score > best_score {
                    best_score = score;
                    best_class = class;
                }
            }
            if best_score < self.confidence_threshold {
                continue;
            }

            let cx = view[[0, 0, anchor]];
            let cy = view[[0, 1, anchor]];
            let w = view[[0, 2, anchor]];
            let h = view[[0, 3, anchor]];
            let label = COCO_LABELS
                .get(best_class)
                .copied()
                .unwrap_or("object")
                .to_string();

            candidates.push(Detection {
                label,
                x1: (cx - w / 2.0).max(0.0),
                y1: (cy - h / 2.0).max(0.0),
                x2: (cx + w / 2.0).min(self.width as f32),
                y2: (cy + h / 2.0).min(self.height as f32),
                confidence: best_score,
            });
        }

        Ok(non_max_suppression(candidates))
    }
}

impl DetectorBackend for TractDetector {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs)
    }

    fn warm_up(&mut self) -> Result<()> {
        let pixels = vec![0u8; (self.width * self.height * 3) as usize];
        let frame = Frame::from_rgb(pixels, self.width, self.height)?;
        self.detect(&frame).map(|_| ())
    }
}

/// Greedy IoU suppression: keep the highest-confidence box, drop overlaps.
fn non_max_suppression(mut candidates: Vec<Detection>) -> Vec<Detection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        let overlaps = kept
            .iter()
            .any(|k| k.label == candidate.label && iou(k, &candidate) > NMS_IOU_THRESHOLD);
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &Detection, b: &Detection) -> f32 {
    let ix1 = a.x1.max(b.x1);
    let iy1 = a.y1.max(b.y1);
    let ix2 = a.x2.min(b.x2);
    let iy2 = a.y2.min(b.y2);
    let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    let area_a = (a.x2 - a.x1).max(0.0) * (a.y2 - a.y1).max(0.0);
    let area_b = (b.x2 - b.x1).max(0.0) * (b.y2 - b.y1).max(0.0);
    let union = area_a + area_b - inter;
    if union <= 0.0 {
        return 0.0;
    }
    inter / union
}
