//! Model descriptors and the format/identity vocabulary used to dispatch on them.

use crate::core::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Identifier of a registered model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Creates a model id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for ModelId {
    fn from(id: u64) -> Self {
        Self::new(id.to_string())
    }
}

/// Model file formats the loader knows how to turn into a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    /// Box detector bundle (YOLO family exported to ONNX).
    Detector,
    /// ONNX graph run in a tensor session with named ports.
    TensorSession,
    /// Lightweight ORT-format graph with buffers allocated at load time.
    Interpreter,
    /// Bundled landmark estimation pipeline; needs no descriptor weights.
    Landmark,
}

impl ModelFormat {
    /// Every supported format.
    pub const ALL: [ModelFormat; 4] = [
        ModelFormat::Detector,
        ModelFormat::TensorSession,
        ModelFormat::Interpreter,
        ModelFormat::Landmark,
    ];

    /// Canonical tag of the format.
    pub fn tag(&self) -> &'static str {
        match self {
            ModelFormat::Detector => "yolo",
            ModelFormat::TensorSession => "onnx",
            ModelFormat::Interpreter => "ort",
            ModelFormat::Landmark => "landmark",
        }
    }

    /// Whether descriptors of this format must carry a weights location.
    pub fn requires_weights(&self) -> bool {
        !matches!(self, ModelFormat::Landmark)
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ModelFormat {
    type Err = PipelineError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "yolo" | "detector" => Ok(ModelFormat::Detector),
            "onnx" | "graph" => Ok(ModelFormat::TensorSession),
            "ort" | "interpreter" | "tflite" => Ok(ModelFormat::Interpreter),
            "landmark" | "mediapipe" => Ok(ModelFormat::Landmark),
            _ => Err(PipelineError::unsupported_format(tag)),
        }
    }
}

/// The shape of a model's output, which decides how it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    /// Boxes with labels and scores.
    Detector,
    /// A single class index with a score.
    Classifier,
    /// Landmark point sets with a connection topology.
    Landmark,
}

/// Where a model's weights live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightsLocation {
    /// A file, or a bundle directory for detectors.
    Path(PathBuf),
    /// Serialized weights already in memory, e.g. read from the blob store.
    #[serde(skip)]
    Memory(Arc<[u8]>),
}

impl WeightsLocation {
    /// Human-readable description used in errors and logs.
    pub fn describe(&self) -> String {
        match self {
            WeightsLocation::Path(path) => path.display().to_string(),
            WeightsLocation::Memory(bytes) => format!("<memory: {} bytes>", bytes.len()),
        }
    }
}

impl From<PathBuf> for WeightsLocation {
    fn from(path: PathBuf) -> Self {
        WeightsLocation::Path(path)
    }
}

impl From<Vec<u8>> for WeightsLocation {
    fn from(bytes: Vec<u8>) -> Self {
        WeightsLocation::Memory(bytes.into())
    }
}

/// Immutable metadata identifying a registered model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Registry id.
    pub id: ModelId,
    /// Symbolic model name; selects the inference strategy.
    pub name: String,
    /// Format tag as registered.
    pub format_tag: String,
    /// Weights location; absent for landmark pipelines.
    #[serde(default)]
    pub weights: Option<WeightsLocation>,
    /// Category name the model is filed under.
    #[serde(default)]
    pub category: String,
}

impl ModelDescriptor {
    /// Creates a descriptor.
    pub fn new(
        id: impl Into<ModelId>,
        name: impl Into<String>,
        format_tag: impl Into<String>,
        weights: Option<WeightsLocation>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            format_tag: format_tag.into(),
            weights,
            category: String::new(),
        }
    }

    /// Sets the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Parses the format tag.
    pub fn format(&self) -> Result<ModelFormat, PipelineError> {
        self.format_tag.parse()
    }

    /// Checks the format tag and the weights requirement.
    pub fn validate(&self) -> Result<ModelFormat, PipelineError> {
        let format = self.format()?;
        if format.requires_weights() && self.weights.is_none() {
            return Err(PipelineError::model_load(
                format!("model '{}'", self.id),
                format!("format '{}' requires a weights location", format),
                None,
            ));
        }
        Ok(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tags_and_aliases() {
        assert_eq!("yolo".parse::<ModelFormat>().unwrap(), ModelFormat::Detector);
        assert_eq!("ONNX".parse::<ModelFormat>().unwrap(), ModelFormat::TensorSession);
        assert_eq!("tflite".parse::<ModelFormat>().unwrap(), ModelFormat::Interpreter);
        assert_eq!(" mediapipe ".parse::<ModelFormat>().unwrap(), ModelFormat::Landmark);
        for format in ModelFormat::ALL {
            assert_eq!(format.tag().parse::<ModelFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_unknown_format_is_unsupported() {
        let err = "caffe".parse::<ModelFormat>().unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { ref tag } if tag == "caffe"));
    }

    #[test]
    fn test_weights_required_except_landmark() {
        let detector = ModelDescriptor::new("1", "YOLOv11x Object Detection", "yolo", None);
        assert!(matches!(
            detector.validate(),
            Err(PipelineError::ModelLoad { .. })
        ));

        let landmark = ModelDescriptor::new("2", "Hand Landmarks", "landmark", None);
        assert_eq!(landmark.validate().unwrap(), ModelFormat::Landmark);
    }

    #[test]
    fn test_descriptor_deserializes_from_catalog_entry() {
        let descriptor: ModelDescriptor = serde_json::from_str(
            r#"{
                "id": "4",
                "name": "Age Classification",
                "format_tag": "onnx",
                "weights": { "path": "models/age_net.onnx" },
                "category": "Face Analysis"
            }"#,
        )
        .unwrap();
        assert_eq!(descriptor.id, ModelId::new("4"));
        assert_eq!(descriptor.category, "Face Analysis");
        assert!(matches!(
            descriptor.weights,
            Some(WeightsLocation::Path(ref p)) if p.ends_with("age_net.onnx")
        ));
    }
}
