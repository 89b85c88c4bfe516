//! Single-label image classifiers.
//!
//! Age and gender are Caffe models trained on BGR 227x227 crops with the
//! per-channel mean subtracted; they emit probabilities. The emotion model
//! takes a 48x48 grayscale image in `[0, 1]` and emits logits.

use crate::core::errors::PipelineError;
use crate::core::traits::{Backend, BackendInput, InferenceStrategy};
use crate::domain::{Classification, ModelKind, RawResult};
use crate::processors::{ColorOrder, NormalizeImage, argmax, softmax, top_k};
use image::{RgbImage, imageops};

/// Mean pixel of the age and gender training set, in BGR order.
pub const CAFFE_FACE_MEAN_BGR: [f32; 3] = [78.426_34, 87.768_91, 114.895_85];

/// Preprocessing parameters of a classifier.
#[derive(Debug, Clone)]
pub struct ClassifierPreprocessConfig {
    /// Model input `(width, height)`.
    pub input_size: (u32, u32),
    /// Channel layout.
    pub color: ColorOrder,
    /// Multiplier applied before mean subtraction.
    pub scale: f32,
    /// Per-channel mean in tensor channel order.
    pub mean: Vec<f32>,
    /// Whether the outputs are logits that need a softmax.
    pub apply_softmax: bool,
}

impl ClassifierPreprocessConfig {
    fn caffe_face() -> Self {
        Self {
            input_size: (227, 227),
            color: ColorOrder::Bgr,
            scale: 1.0,
            mean: CAFFE_FACE_MEAN_BGR.to_vec(),
            apply_softmax: false,
        }
    }

    fn emotion() -> Self {
        Self {
            input_size: (48, 48),
            color: ColorOrder::Gray,
            scale: 1.0 / 255.0,
            mean: vec![0.0],
            apply_softmax: true,
        }
    }
}

/// Inference strategy for the classifier family.
#[derive(Debug)]
pub struct ImageClassifier {
    kind: ModelKind,
    input_size: (u32, u32),
    normalizer: NormalizeImage,
    apply_softmax: bool,
    labels: &'static [&'static str],
}

impl ImageClassifier {
    /// Creates a classifier for `kind` with the given preprocessing.
    pub fn new(kind: ModelKind, config: ClassifierPreprocessConfig) -> Result<Self, PipelineError> {
        let std = vec![1.0; config.color.channels()];
        let normalizer = NormalizeImage::new(config.scale, config.mean, std, config.color)?;
        Ok(Self {
            kind,
            input_size: config.input_size,
            normalizer,
            apply_softmax: config.apply_softmax,
            labels: kind.labels(),
        })
    }

    pub fn age() -> Result<Self, PipelineError> {
        Self::new(ModelKind::AgeClassification, ClassifierPreprocessConfig::caffe_face())
    }

    pub fn gender() -> Result<Self, PipelineError> {
        Self::new(ModelKind::GenderClassification, ClassifierPreprocessConfig::caffe_face())
    }

    pub fn emotion() -> Result<Self, PipelineError> {
        Self::new(ModelKind::EmotionRecognition, ClassifierPreprocessConfig::emotion())
    }

    /// Maps per-class scores to the winning class.
    pub fn postprocess(&self, scores: &[f32]) -> Result<Classification, PipelineError> {
        let probs = if self.apply_softmax {
            softmax(scores)
        } else {
            scores.to_vec()
        };
        let (class_id, score) = argmax(&probs).ok_or_else(|| {
            PipelineError::inference_msg(
                self.kind.canonical_name(),
                "classifier produced no scores",
            )
        })?;
        tracing::trace!(model = %self.kind, top = ?top_k(&probs, 3), "classifier scores");

        let label = self.labels.get(class_id).ok_or_else(|| {
            PipelineError::inference_msg(
                self.kind.canonical_name(),
                format!(
                    "class index {class_id} outside the {}-entry label table",
                    self.labels.len()
                ),
            )
        })?;

        Ok(Classification {
            class_id,
            label: (*label).to_string(),
            score,
        })
    }
}

impl InferenceStrategy for ImageClassifier {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn infer(&self, backend: &dyn Backend, image: &RgbImage) -> Result<RawResult, PipelineError> {
        let (w, h) = backend
            .input_size()
            .filter(|&(w, h)| w > 0 && h > 0)
            .unwrap_or(self.input_size);
        let resized = imageops::resize(image, w, h, imageops::FilterType::Triangle);
        let tensor = self.normalizer.normalize_to(&resized)?;

        let outputs = backend.run(BackendInput::Tensor(tensor))?;
        let output = outputs.require_first(backend.name())?;
        let scores: Vec<f32> = output.iter().copied().collect();

        Ok(RawResult::Classification(self.postprocess(&scores)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelFormat;
    use crate::testing::{FakeBackend, single_output};

    #[test]
    fn test_age_index_three_is_fifteen_to_twenty() {
        let mut probs = vec![0.01; 8];
        probs[3] = 0.9;
        let backend = FakeBackend::new(ModelFormat::TensorSession, single_output(&[1, 8], probs));
        let result = ImageClassifier::age()
            .unwrap()
            .infer(&backend, &RgbImage::new(300, 200))
            .unwrap();
        let RawResult::Classification(c) = result else {
            panic!("expected classification");
        };
        assert_eq!(c.class_id, 3);
        assert_eq!(c.label, "(15-20)");
        assert!((c.score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_emotion_applies_softmax() {
        let logits = vec![0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0];
        let backend = FakeBackend::new(ModelFormat::Interpreter, single_output(&[1, 7], logits));
        let result = ImageClassifier::emotion()
            .unwrap()
            .infer(&backend, &RgbImage::new(64, 64))
            .unwrap();
        let RawResult::Classification(c) = result else {
            panic!("expected classification");
        };
        assert_eq!(c.label, "Happy");
        assert!(c.score > 0.9 && c.score < 1.0);
    }

    #[test]
    fn test_declared_input_size_wins() {
        let mut backend =
            FakeBackend::new(ModelFormat::TensorSession, single_output(&[1, 2], vec![0.3, 0.7]));
        let gender = ImageClassifier::gender().unwrap();

        gender.infer(&backend, &RgbImage::new(90, 60)).unwrap();
        assert_eq!(backend.last_input().as_deref(), Some("tensor [1, 3, 227, 227]"));

        backend.input_size = Some((32, 40));
        gender.infer(&backend, &RgbImage::new(90, 60)).unwrap();
        assert_eq!(backend.last_input().as_deref(), Some("tensor [1, 3, 40, 32]"));
        assert_eq!(backend.calls(), 2);
    }

    #[test]
    fn test_index_outside_table_is_inference_error() {
        let gender = ImageClassifier::gender().unwrap();
        let err = gender.postprocess(&[0.1, 0.2, 0.7]).unwrap_err();
        assert!(matches!(err, PipelineError::Inference { .. }));
        assert!(gender.postprocess(&[]).is_err());
    }
}
