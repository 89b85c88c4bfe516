//! Strategy lookup keyed by format and model identity.

use crate::core::config::DetectionConfig;
use crate::core::errors::PipelineError;
use crate::core::traits::InferenceStrategy;
use crate::domain::{ModelDescriptor, ModelFormat, ModelKind};
use crate::models::{ImageClassifier, LandmarkEstimator, YoloDetector};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps `(format, model identity)` to the strategy that serves it.
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<(ModelFormat, ModelKind), Arc<dyn InferenceStrategy>>,
}

impl StrategyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding a strategy for every [`ModelKind`].
    pub fn with_defaults(detection: &DetectionConfig) -> Result<Self, PipelineError> {
        let mut registry = Self::new();
        for kind in ModelKind::ALL {
            registry.register(default_strategy(kind, detection)?)?;
        }
        Ok(registry)
    }

    /// Adds or replaces the strategy for its model identity.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Config`] if the strategy's format or family
    /// disagrees with its model identity.
    pub fn register(&mut self, strategy: Arc<dyn InferenceStrategy>) -> Result<(), PipelineError> {
        let kind = strategy.kind();
        if strategy.format() != kind.format() {
            return Err(PipelineError::config_error(format!(
                "strategy for '{kind}' drives '{}' backends, expected '{}'",
                strategy.format(),
                kind.format()
            )));
        }
        if strategy.family() != kind.family() {
            return Err(PipelineError::config_error(format!(
                "strategy for '{kind}' produces {:?} results, expected {:?}",
                strategy.family(),
                kind.family()
            )));
        }
        self.strategies.insert((kind.format(), kind), strategy);
        Ok(())
    }

    /// Looks a strategy up by format and identity.
    pub fn get(&self, format: ModelFormat, kind: ModelKind) -> Option<Arc<dyn InferenceStrategy>> {
        self.strategies.get(&(format, kind)).cloned()
    }

    /// Resolves the strategy for a descriptor.
    ///
    /// # Errors
    ///
    /// * [`PipelineError::UnsupportedFormat`] for an unknown format tag
    /// * [`PipelineError::UnsupportedModel`] when the format is known but no
    ///   strategy serves this model under it
    pub fn resolve(
        &self,
        descriptor: &ModelDescriptor,
    ) -> Result<Arc<dyn InferenceStrategy>, PipelineError> {
        let format = descriptor.format()?;
        ModelKind::from_name(&descriptor.name)
            .and_then(|kind| self.get(format, kind))
            .ok_or_else(|| PipelineError::UnsupportedModel {
                model: descriptor.name.clone(),
                format: format.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

fn default_strategy(
    kind: ModelKind,
    detection: &DetectionConfig,
) -> Result<Arc<dyn InferenceStrategy>, PipelineError> {
    let strategy: Arc<dyn InferenceStrategy> = match kind {
        ModelKind::ObjectDetection => Arc::new(YoloDetector::new(detection)?),
        ModelKind::AgeClassification => Arc::new(ImageClassifier::age()?),
        ModelKind::GenderClassification => Arc::new(ImageClassifier::gender()?),
        ModelKind::EmotionRecognition => Arc::new(ImageClassifier::emotion()?),
        ModelKind::HandLandmarks | ModelKind::PoseLandmarks => {
            Arc::new(LandmarkEstimator::new(kind).ok_or_else(|| {
                PipelineError::config_error(format!("'{kind}' has no landmark topology"))
            })?)
        }
    };
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::Backend;
    use crate::domain::{ModelFamily, RawResult};
    use image::RgbImage;

    #[test]
    fn test_defaults_cover_every_kind() {
        let registry = StrategyRegistry::with_defaults(&DetectionConfig::default()).unwrap();
        assert_eq!(registry.len(), ModelKind::ALL.len());
        for kind in ModelKind::ALL {
            let strategy = registry.get(kind.format(), kind).unwrap();
            assert_eq!(strategy.kind(), kind);
        }
    }

    #[test]
    fn test_resolve_by_descriptor() {
        let registry = StrategyRegistry::with_defaults(&DetectionConfig::default()).unwrap();
        let age = ModelDescriptor::new("1", "Age Classification", "graph", None);
        assert_eq!(registry.resolve(&age).unwrap().kind(), ModelKind::AgeClassification);

        let wrong_format = ModelDescriptor::new("2", "Age Classification", "yolo", None);
        assert!(matches!(
            registry.resolve(&wrong_format),
            Err(PipelineError::UnsupportedModel { .. })
        ));

        let unknown_tag = ModelDescriptor::new("3", "Age Classification", "caffe", None);
        assert!(matches!(
            registry.resolve(&unknown_tag),
            Err(PipelineError::UnsupportedFormat { .. })
        ));
    }

    #[derive(Debug)]
    struct MislabeledStrategy;

    impl InferenceStrategy for MislabeledStrategy {
        fn kind(&self) -> ModelKind {
            ModelKind::GenderClassification
        }

        fn family(&self) -> ModelFamily {
            ModelFamily::Detector
        }

        fn infer(&self, _: &dyn Backend, _: &RgbImage) -> Result<RawResult, PipelineError> {
            Ok(RawResult::Empty)
        }
    }

    #[derive(Debug)]
    struct WrongFormatStrategy;

    impl InferenceStrategy for WrongFormatStrategy {
        fn kind(&self) -> ModelKind {
            ModelKind::EmotionRecognition
        }

        fn format(&self) -> ModelFormat {
            ModelFormat::TensorSession
        }

        fn infer(&self, _: &dyn Backend, _: &RgbImage) -> Result<RawResult, PipelineError> {
            Ok(RawResult::Empty)
        }
    }

    #[test]
    fn test_register_rejects_mismatches() {
        let mut registry = StrategyRegistry::new();
        assert!(registry.register(Arc::new(MislabeledStrategy)).is_err());
        assert!(registry.register(Arc::new(WrongFormatStrategy)).is_err());
        assert!(registry.is_empty());
    }
}
