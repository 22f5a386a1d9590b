use std::collections::BTreeSet;

/// One labeled bounding box in frame pixel space.
///
/// Detections live for a single arbitration cycle; nothing persists them.
#[derive(Clone, Debug)]
pub struct Detection {
    pub label: String,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
}

impl Detection {
    /// Box height as a fraction of frame height. This is the cheap distance
    /// proxy behind the danger alert.
    pub fn height_ratio(&self, frame_height: u32) -> f32 {
        if frame_height == 0 {
            return 0.0;
        }
        (self.y2 - self.y1) / frame_height as f32
    }
}

/// Deduplicated labels across a frame's detections, in sorted order.
pub fn label_set(detections: &[Detection]) -> BTreeSet<String> {
    detections.iter().map(|d| d.label.clone()).collect()
}

/// True when any box exceeds the proximity height-ratio threshold.
pub fn any_proximate(detections: &[Detection], frame_height: u32, threshold: f32) -> bool {
    detections
        .iter()
        .any(|d| d.height_ratio(frame_height) > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(label: &str, y1: f32, y2: f32) -> Detection {
        Detection {
            label: label.to_string(),
            x1: 0.0,
            y1,
            x2: 10.0,
            y2,
            confidence: 0.9,
        }
    }

    #[test]
    fn height_ratio_uses_frame_height() {
        // 250px box in a 480px frame: ratio 0.52, above a 0.45 threshold.
        let close = boxed("person", 100.0, 350.0);
        assert!(close.height_ratio(480) > 0.45);

        // 100px box: ratio ~0.21, below threshold.
        let far = boxed("person", 100.0, 200.0);
        assert!(far.height_ratio(480) < 0.45);
    }

    #[test]
    fn label_set_deduplicates() {
        let detections = vec![
            boxed("person", 0.0, 50.0),
            boxed("chair", 0.0, 40.0),
            boxed("person", 10.0, 60.0),
        ];
        let labels = label_set(&detections);
        assert_eq!(labels.len(), 2);
        assert!(labels.contains("person"));
        assert!(labels.contains("chair"));
    }

    #[test]
    fn any_proximate_checks_every_box() {
        let detections = vec![boxed("chair", 0.0, 100.0), boxed("person", 0.0, 250.0)];
        assert!(any_proximate(&detections, 480, 0.45));
        assert!(!any_proximate(&detections, 480, 0.60));
        assert!(!any_proximate(&[], 480, 0.45));
    }
}
