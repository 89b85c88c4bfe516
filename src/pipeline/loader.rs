//! Backend construction from model descriptors.
//!
//! Every format is served by ONNX Runtime. What differs is where the graph
//! comes from and how the session is prepared:
//!
//! * detector bundles are directories holding `model.onnx` and an optional
//!   `labels.txt`, or a bare model file
//! * tensor sessions load a serialized graph from a file or from memory
//! * interpreter models are ORT-format graphs loaded from memory with the
//!   memory pattern enabled, then run once so buffers exist before the first
//!   request
//! * landmark pipelines come from the configured assets directory and ignore
//!   descriptor weights

use crate::core::config::{LandmarkConfig, OrtSessionConfig, PipelineConfig};
use crate::core::constants::{DETECTOR_BUNDLE_LABELS, DETECTOR_BUNDLE_MODEL};
use crate::core::errors::PipelineError;
use crate::core::inference::{OrtInfer, TensorOutputs};
use crate::core::traits::{Backend, BackendInput};
use crate::domain::{ModelDescriptor, ModelFormat, ModelKind, WeightsLocation, labels};
use crate::models::LandmarkPipeline;
use std::path::Path;
use std::sync::Arc;

/// Builds runnable backends.
pub trait BackendLoader: Send + Sync {
    /// Constructs the backend for `descriptor`.
    ///
    /// # Errors
    ///
    /// * [`PipelineError::UnsupportedFormat`] for an unknown format tag
    /// * [`PipelineError::ModelLoad`] when the weights are missing or corrupt
    fn load(&self, descriptor: &ModelDescriptor) -> Result<Arc<dyn Backend>, PipelineError>;
}

/// A single ONNX Runtime session exposed as a backend.
#[derive(Debug)]
pub struct OnnxBackend {
    name: String,
    format: ModelFormat,
    inference: OrtInfer,
    class_names: Option<Vec<String>>,
}

impl OnnxBackend {
    pub fn new(name: impl Into<String>, format: ModelFormat, inference: OrtInfer) -> Self {
        Self {
            name: name.into(),
            format,
            inference,
            class_names: None,
        }
    }

    /// Attaches the labels shipped with the model.
    pub fn with_class_names(mut self, class_names: Vec<String>) -> Self {
        self.class_names = Some(class_names);
        self
    }
}

impl Backend for OnnxBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> ModelFormat {
        self.format
    }

    fn run(&self, input: BackendInput<'_>) -> Result<TensorOutputs, PipelineError> {
        match input {
            BackendInput::Tensor(tensor) => self.inference.run(&tensor),
            other => Err(PipelineError::inference_msg(
                &self.name,
                format!("{} backend takes a tensor, got {}", self.format, other.describe()),
            )),
        }
    }

    fn class_names(&self) -> Option<&[String]> {
        self.class_names.as_deref()
    }

    fn input_size(&self) -> Option<(u32, u32)> {
        self.inference.input_spatial_size().map(|(h, w)| (w, h))
    }
}

/// Loads every format with ONNX Runtime.
#[derive(Debug, Clone, Default)]
pub struct OrtBackendLoader {
    ort_config: Option<OrtSessionConfig>,
    landmark: LandmarkConfig,
}

impl OrtBackendLoader {
    pub fn new(ort_config: Option<OrtSessionConfig>, landmark: LandmarkConfig) -> Self {
        Self {
            ort_config,
            landmark,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.ort_session.clone(), config.landmark.clone())
    }

    fn weights<'a>(
        descriptor: &'a ModelDescriptor,
        format: ModelFormat,
    ) -> Result<&'a WeightsLocation, PipelineError> {
        descriptor.weights.as_ref().ok_or_else(|| {
            PipelineError::model_load(
                format!("model '{}'", descriptor.id),
                format!("format '{format}' requires a weights location"),
                None,
            )
        })
    }

    fn open(
        &self,
        descriptor: &ModelDescriptor,
        weights: &WeightsLocation,
        config: Option<&OrtSessionConfig>,
    ) -> Result<OrtInfer, PipelineError> {
        match weights {
            WeightsLocation::Path(path) => OrtInfer::from_file(path, config),
            WeightsLocation::Memory(bytes) => {
                OrtInfer::from_memory(bytes, descriptor.name.clone(), config)
            }
        }
    }

    fn load_detector(&self, descriptor: &ModelDescriptor) -> Result<OnnxBackend, PipelineError> {
        let weights = Self::weights(descriptor, ModelFormat::Detector)?;
        let (inference, class_names) = match weights {
            WeightsLocation::Path(dir) if dir.is_dir() => {
                let model_path = dir.join(DETECTOR_BUNDLE_MODEL);
                if !model_path.is_file() {
                    return Err(PipelineError::model_load(
                        dir.display(),
                        format!("detector bundle has no {DETECTOR_BUNDLE_MODEL}"),
                        None,
                    ));
                }
                let inference = OrtInfer::from_file(&model_path, self.ort_config.as_ref())?;
                (inference, read_bundle_labels(dir)?)
            }
            other => (self.open(descriptor, other, self.ort_config.as_ref())?, None),
        };

        let backend = OnnxBackend::new(descriptor.name.clone(), ModelFormat::Detector, inference);
        Ok(match class_names {
            Some(names) => backend.with_class_names(names),
            None => backend,
        })
    }

    fn load_interpreter(&self, descriptor: &ModelDescriptor) -> Result<OnnxBackend, PipelineError> {
        let weights = Self::weights(descriptor, ModelFormat::Interpreter)?;
        let bytes: Arc<[u8]> = match weights {
            WeightsLocation::Memory(bytes) => bytes.clone(),
            WeightsLocation::Path(path) => std::fs::read(path)
                .map_err(|e| {
                    PipelineError::model_load_source(path.display(), "failed to read model", e)
                })?
                .into(),
        };

        let config = self
            .ort_config
            .clone()
            .unwrap_or_default()
            .with_memory_pattern(true);
        let inference = OrtInfer::from_memory(&bytes, descriptor.name.clone(), Some(&config))?;
        if inference.warm_up()? {
            tracing::debug!(model = %descriptor.name, "interpreter buffers allocated");
        }
        Ok(OnnxBackend::new(
            descriptor.name.clone(),
            ModelFormat::Interpreter,
            inference,
        ))
    }

    fn load_landmark(
        &self,
        descriptor: &ModelDescriptor,
    ) -> Result<LandmarkPipeline, PipelineError> {
        let topology = ModelKind::from_name(&descriptor.name)
            .and_then(|kind| kind.topology())
            .ok_or_else(|| PipelineError::UnsupportedModel {
                model: descriptor.name.clone(),
                format: ModelFormat::Landmark.to_string(),
            })?;
        LandmarkPipeline::load(topology, &self.landmark, self.ort_config.as_ref())
    }
}

/// Reads `labels.txt` from a detector bundle, if present.
fn read_bundle_labels(dir: &Path) -> Result<Option<Vec<String>>, PipelineError> {
    let path = dir.join(DETECTOR_BUNDLE_LABELS);
    if !path.is_file() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path)
        .map_err(|e| PipelineError::model_load_source(path.display(), "failed to read labels", e))?;
    let names = labels::parse_label_file(&contents);
    Ok((!names.is_empty()).then_some(names))
}

impl BackendLoader for OrtBackendLoader {
    fn load(&self, descriptor: &ModelDescriptor) -> Result<Arc<dyn Backend>, PipelineError> {
        let format = descriptor.format()?;
        let backend: Arc<dyn Backend> = match format {
            ModelFormat::Detector => Arc::new(self.load_detector(descriptor)?),
            ModelFormat::TensorSession => {
                let weights = Self::weights(descriptor, format)?;
                let inference = self.open(descriptor, weights, self.ort_config.as_ref())?;
                Arc::new(OnnxBackend::new(descriptor.name.clone(), format, inference))
            }
            ModelFormat::Interpreter => Arc::new(self.load_interpreter(descriptor)?),
            ModelFormat::Landmark => Arc::new(self.load_landmark(descriptor)?),
        };

        tracing::info!(
            model_id = %descriptor.id,
            model = %descriptor.name,
            format = %format,
            "backend loaded"
        );
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn descriptor(name: &str, tag: &str, weights: Option<WeightsLocation>) -> ModelDescriptor {
        ModelDescriptor::new("9", name, tag, weights)
    }

    #[test]
    fn test_unknown_tag_is_unsupported_format() {
        let err = OrtBackendLoader::default()
            .load(&descriptor("Style Transfer", "caffe", None))
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_missing_weights_is_model_load() {
        for tag in ["yolo", "onnx", "ort"] {
            let err = OrtBackendLoader::default()
                .load(&descriptor("Age Classification", tag, None))
                .unwrap_err();
            assert!(matches!(err, PipelineError::ModelLoad { .. }), "{tag}");
        }
    }

    #[test]
    fn test_bundle_without_model_is_model_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DETECTOR_BUNDLE_LABELS), "helmet\nvest\n").unwrap();
        let weights = WeightsLocation::Path(dir.path().to_path_buf());
        let err = OrtBackendLoader::default()
            .load(&descriptor("YOLOv11x Object Detection", "yolo", Some(weights)))
            .unwrap_err();
        match err {
            PipelineError::ModelLoad { message, .. } => assert!(message.contains("model.onnx")),
            other => panic!("expected ModelLoad, got {other:?}"),
        }
        assert_eq!(
            read_bundle_labels(dir.path()).unwrap(),
            Some(vec!["helmet".to_string(), "vest".to_string()])
        );
    }

    #[test]
    fn test_corrupt_graph_is_model_load() {
        let weights = WeightsLocation::from(vec![7u8; 32]);
        let err = OrtBackendLoader::default()
            .load(&descriptor("Emotion Recognition", "tflite", Some(weights)))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ModelLoad { .. }));

        let missing = WeightsLocation::Path(PathBuf::from("no/such/age_net.onnx"));
        let err = OrtBackendLoader::default()
            .load(&descriptor("Age Classification", "onnx", Some(missing)))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ModelLoad { .. }));
    }

    #[test]
    fn test_landmark_needs_known_topology_and_assets() {
        let dir = tempfile::tempdir().unwrap();
        let loader = OrtBackendLoader::new(
            None,
            LandmarkConfig {
                assets_dir: dir.path().to_path_buf(),
                ..LandmarkConfig::default()
            },
        );
        assert!(matches!(
            loader.load(&descriptor("Face Mesh", "landmark", None)),
            Err(PipelineError::UnsupportedModel { .. })
        ));
        assert!(matches!(
            loader.load(&descriptor("Pose Landmarks", "mediapipe", None)),
            Err(PipelineError::ModelLoad { .. })
        ));
    }
}
