//! Pipeline configuration.
//!
//! [`PipelineConfig`] is deserialized from JSON; every field has a default so a
//! config file only needs to name what it overrides.

use super::onnx::OrtSessionConfig;
use crate::core::constants::*;
use crate::core::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Postprocessing parameters for box detectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Square input size the detector expects.
    pub input_size: u32,
    /// Minimum confidence for a box to be kept.
    pub score_threshold: f32,
    /// IoU above which same-class boxes are suppressed.
    pub iou_threshold: f32,
    /// Maximum number of boxes kept after NMS.
    pub max_detections: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_DETECTION_INPUT_SIZE,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
        }
    }
}

/// Landmark pipeline parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkConfig {
    /// Directory holding `<topology>_detector.onnx` and `<topology>_landmarks.onnx`.
    pub assets_dir: PathBuf,
    /// Minimum region detection score.
    pub min_detection_confidence: f32,
    /// Minimum landmark presence score.
    pub min_tracking_confidence: f32,
    /// Maximum number of landmark sets per image.
    pub max_num_sets: usize,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from(DEFAULT_LANDMARK_ASSETS_DIR),
            min_detection_confidence: DEFAULT_MIN_DETECTION_CONFIDENCE,
            min_tracking_confidence: DEFAULT_MIN_TRACKING_CONFIDENCE,
            max_num_sets: DEFAULT_MAX_LANDMARK_SETS,
        }
    }
}

/// Overlay rendering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Font file used for captions. When unset, common system fonts are tried.
    pub font_path: Option<PathBuf>,
    /// Box outline thickness in pixels.
    pub box_thickness: u32,
    /// Detection caption font size in pixels.
    pub label_font_size: f32,
    /// JPEG quality of the canonical output (1-100).
    pub jpeg_quality: u8,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            box_thickness: DEFAULT_BOX_THICKNESS,
            label_font_size: DEFAULT_LABEL_FONT_SIZE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Per backend call timeout in milliseconds. `None` disables the timeout.
    pub inference_timeout_ms: Option<u64>,
    /// Detector postprocessing.
    pub detection: DetectionConfig,
    /// Landmark pipeline settings.
    pub landmark: LandmarkConfig,
    /// Overlay rendering and output encoding.
    pub annotation: AnnotationConfig,
    /// ONNX Runtime session options.
    pub ort_session: Option<OrtSessionConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inference_timeout_ms: Some(DEFAULT_INFERENCE_TIMEOUT_MS),
            detection: DetectionConfig::default(),
            landmark: LandmarkConfig::default(),
            annotation: AnnotationConfig::default(),
            ort_session: None,
        }
    }
}

impl PipelineConfig {
    /// Reads and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            PipelineError::config_error(format!(
                "failed to parse config '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the inference timeout as a [`Duration`], if enabled.
    pub fn inference_timeout(&self) -> Option<Duration> {
        self.inference_timeout_ms.map(Duration::from_millis)
    }

    /// Checks every value for range errors.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.inference_timeout_ms == Some(0) {
            return Err(PipelineError::config_error_with_context(
                "inference_timeout_ms",
                "0",
                "must be greater than 0 (omit it to disable the timeout)",
            ));
        }

        let det = &self.detection;
        if det.input_size == 0 || det.input_size % 32 != 0 {
            return Err(PipelineError::config_error_with_context(
                "detection.input_size",
                &det.input_size.to_string(),
                "must be a positive multiple of 32",
            ));
        }
        check_unit_interval("detection.score_threshold", det.score_threshold)?;
        check_unit_interval("detection.iou_threshold", det.iou_threshold)?;
        if det.max_detections == 0 {
            return Err(PipelineError::config_error_with_context(
                "detection.max_detections",
                "0",
                "must be greater than 0",
            ));
        }

        let lm = &self.landmark;
        check_unit_interval(
            "landmark.min_detection_confidence",
            lm.min_detection_confidence,
        )?;
        check_unit_interval(
            "landmark.min_tracking_confidence",
            lm.min_tracking_confidence,
        )?;
        if lm.max_num_sets == 0 {
            return Err(PipelineError::config_error_with_context(
                "landmark.max_num_sets",
                "0",
                "must be greater than 0",
            ));
        }

        let ann = &self.annotation;
        if ann.jpeg_quality == 0 || ann.jpeg_quality > 100 {
            return Err(PipelineError::config_error_with_context(
                "annotation.jpeg_quality",
                &ann.jpeg_quality.to_string(),
                "must be between 1 and 100",
            ));
        }
        if !(ann.label_font_size.is_finite() && ann.label_font_size > 0.0) {
            return Err(PipelineError::config_error_with_context(
                "annotation.label_font_size",
                &ann.label_font_size.to_string(),
                "must be a positive number",
            ));
        }
        Ok(())
    }
}

fn check_unit_interval(field: &str, value: f32) -> Result<(), PipelineError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(PipelineError::config_error_with_context(
            field,
            &value.to_string(),
            "must be within [0, 1]",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.inference_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.landmark.min_detection_confidence, 0.5);
        assert_eq!(config.landmark.min_tracking_confidence, 0.5);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "detection": {{ "score_threshold": 0.4 }}, "inference_timeout_ms": 500 }}"#
        )
        .unwrap();

        let config = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.detection.score_threshold, 0.4);
        assert_eq!(config.detection.input_size, DEFAULT_DETECTION_INPUT_SIZE);
        assert_eq!(config.inference_timeout(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = PipelineConfig::default();
        config.detection.iou_threshold = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("detection.iou_threshold"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = PipelineConfig {
            inference_timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Config { .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            PipelineConfig::from_json_file(file.path()),
            Err(PipelineError::Config { .. })
        ));
    }
}
