//! Structured inference results, before any rendering.

use super::descriptor::ModelFamily;
use super::topology::Topology;

/// Axis-aligned box in source image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
}

impl BoundingBox {
    /// Creates a box from its corners.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Creates a box from a center point and a size.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    /// Width, never negative.
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    /// Height, never negative.
    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    /// Area, never negative.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }

    /// Clips the box to `[0, width] x [0, height]`.
    pub fn clip(&self, width: f32, height: f32) -> Self {
        Self::new(
            self.x1.clamp(0.0, width),
            self.y1.clamp(0.0, height),
            self.x2.clamp(0.0, width),
            self.y2.clamp(0.0, height),
        )
    }
}

/// One detected object.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Box in source pixels.
    pub bbox: BoundingBox,
    /// Class index.
    pub class_id: usize,
    /// Class label.
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub score: f32,
}

/// Winning class of a classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Class index.
    pub class_id: usize,
    /// Class label.
    pub label: String,
    /// Probability of the winning class.
    pub score: f32,
}

/// A landmark point. `x` and `y` are normalized to the image size; `z` is
/// relative depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One detected hand or body with its points.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    /// Points, in topology order.
    pub points: Vec<Landmark>,
    /// How the points are connected.
    pub topology: &'static Topology,
    /// Presence score.
    pub score: f32,
}

/// Output of one inference call.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    /// The model found nothing.
    Empty,
    /// Detector output.
    Detections(Vec<Detection>),
    /// Classifier output.
    Classification(Classification),
    /// Landmark pipeline output.
    Landmarks(Vec<LandmarkSet>),
}

impl RawResult {
    /// Whether this result can come out of a model of the given family.
    /// `Empty` fits every family.
    pub fn matches_family(&self, family: ModelFamily) -> bool {
        matches!(
            (self, family),
            (RawResult::Empty, _)
                | (RawResult::Detections(_), ModelFamily::Detector)
                | (RawResult::Classification(_), ModelFamily::Classifier)
                | (RawResult::Landmarks(_), ModelFamily::Landmark)
        )
    }

    /// Short variant name for logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            RawResult::Empty => "empty",
            RawResult::Detections(_) => "detections",
            RawResult::Classification(_) => "classification",
            RawResult::Landmarks(_) => "landmarks",
        }
    }

    /// Number of findings: boxes, landmark sets, or one for a classification.
    pub fn len(&self) -> usize {
        match self {
            RawResult::Empty => 0,
            RawResult::Detections(d) => d.len(),
            RawResult::Classification(_) => 1,
            RawResult::Landmarks(l) => l.len(),
        }
    }

    /// Whether there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
