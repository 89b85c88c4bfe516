//! Model identities the pipeline knows how to pre- and post-process.

use super::descriptor::{ModelFamily, ModelFormat};
use super::labels;
use super::topology::{self, Topology};
use std::fmt;

/// A model identity, resolved from a descriptor's symbolic name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKind {
    /// YOLO box detector over the COCO classes.
    ObjectDetection,
    /// Face age bracket classifier.
    AgeClassification,
    /// Face gender classifier.
    GenderClassification,
    /// Facial expression classifier.
    EmotionRecognition,
    /// 21-point hand landmarks.
    HandLandmarks,
    /// 33-point body pose landmarks.
    PoseLandmarks,
}

impl ModelKind {
    /// Every known model identity.
    pub const ALL: [ModelKind; 6] = [
        ModelKind::ObjectDetection,
        ModelKind::AgeClassification,
        ModelKind::GenderClassification,
        ModelKind::EmotionRecognition,
        ModelKind::HandLandmarks,
        ModelKind::PoseLandmarks,
    ];

    /// The name models of this kind are registered under.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            ModelKind::ObjectDetection => "YOLOv11x Object Detection",
            ModelKind::AgeClassification => "Age Classification",
            ModelKind::GenderClassification => "Gender Classification",
            ModelKind::EmotionRecognition => "Emotion Recognition",
            ModelKind::HandLandmarks => "Hand Landmarks",
            ModelKind::PoseLandmarks => "Pose Landmarks",
        }
    }

    /// Resolves a symbolic model name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase();
        let kind = match normalized.as_str() {
            "yolov11x object detection" | "object detection" | "yolo" | "yolov11x" => {
                ModelKind::ObjectDetection
            }
            "age classification" | "age" => ModelKind::AgeClassification,
            "gender classification" | "gender" => ModelKind::GenderClassification,
            "emotion recognition" | "emotion" => ModelKind::EmotionRecognition,
            "hand landmarks" | "hand landmark detection" | "hands" => ModelKind::HandLandmarks,
            "pose landmarks" | "pose landmark detection" | "pose" => ModelKind::PoseLandmarks,
            _ => return None,
        };
        Some(kind)
    }

    /// The format models of this kind are served in.
    pub fn format(&self) -> ModelFormat {
        match self {
            ModelKind::ObjectDetection => ModelFormat::Detector,
            ModelKind::AgeClassification | ModelKind::GenderClassification => {
                ModelFormat::TensorSession
            }
            ModelKind::EmotionRecognition => ModelFormat::Interpreter,
            ModelKind::HandLandmarks | ModelKind::PoseLandmarks => ModelFormat::Landmark,
        }
    }

    /// The output family, which decides the overlay.
    pub fn family(&self) -> ModelFamily {
        match self {
            ModelKind::ObjectDetection => ModelFamily::Detector,
            ModelKind::AgeClassification
            | ModelKind::GenderClassification
            | ModelKind::EmotionRecognition => ModelFamily::Classifier,
            ModelKind::HandLandmarks | ModelKind::PoseLandmarks => ModelFamily::Landmark,
        }
    }

    /// Built-in class labels. Detectors fall back to these when their bundle
    /// ships no label file.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            ModelKind::ObjectDetection => labels::COCO_CLASSES,
            ModelKind::AgeClassification => labels::AGE_BRACKETS,
            ModelKind::GenderClassification => labels::GENDERS,
            ModelKind::EmotionRecognition => labels::EMOTIONS,
            ModelKind::HandLandmarks | ModelKind::PoseLandmarks => &[],
        }
    }

    /// Connection topology of landmark models.
    pub fn topology(&self) -> Option<&'static Topology> {
        match self {
            ModelKind::HandLandmarks => Some(&topology::HAND),
            ModelKind::PoseLandmarks => Some(&topology::POSE),
            _ => None,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(ModelKind::from_name(kind.canonical_name()), Some(kind));
        }
        assert_eq!(
            ModelKind::from_name("  age CLASSIFICATION "),
            Some(ModelKind::AgeClassification)
        );
        assert_eq!(ModelKind::from_name("Style Transfer"), None);
    }

    #[test]
    fn test_family_and_format_are_consistent() {
        for kind in ModelKind::ALL {
            match kind.family() {
                ModelFamily::Landmark => {
                    assert_eq!(kind.format(), ModelFormat::Landmark);
                    assert!(kind.topology().is_some());
                    assert!(kind.labels().is_empty());
                }
                _ => {
                    assert!(kind.topology().is_none());
                    assert!(!kind.labels().is_empty());
                }
            }
        }
    }

    #[test]
    fn test_label_tables() {
        assert_eq!(ModelKind::AgeClassification.labels()[3], "(15-20)");
        assert_eq!(ModelKind::GenderClassification.labels(), &["Male", "Female"]);
        assert_eq!(ModelKind::EmotionRecognition.labels().len(), 7);
        assert_eq!(ModelKind::ObjectDetection.labels()[15], "cat");
    }
}
