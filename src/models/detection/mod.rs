//! Box detectors.

pub mod yolo;

pub use yolo::{YoloDetector, YoloPostprocessConfig};
