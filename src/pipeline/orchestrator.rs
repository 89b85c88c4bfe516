//! End-to-end processing of one image with one model.
//!
//! [`ProcessingOrchestrator`] walks a request through
//! `Loading -> Inferring -> Annotating -> Encoding` and is the only component
//! that converts a [`PipelineError`] into a [`ProcessingFailure`]. Panics in
//! any stage are caught here and reported against the stage that raised them.

use super::annotator::Annotator;
use super::cache::BackendCache;
use super::dispatcher::{InferenceDispatcher, panic_message};
use super::loader::{BackendLoader, OrtBackendLoader};
use super::registry::StrategyRegistry;
use super::resolver::ModelDescriptorResolver;
use super::state::PipelineState;
use super::stats::{ProcessingStats, StatsManager};
use crate::core::config::PipelineConfig;
use crate::core::errors::{PipelineError, ProcessingFailure};
use crate::domain::{
    ImageAsset, ModelDescriptor, ModelId, OutputFormat, ProcessedArtifact, StageTimings,
};
use crate::utils::image::{decode_image, encode_jpeg};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Coordinates loading, inference, annotation and encoding.
pub struct ProcessingOrchestrator {
    loader: Arc<dyn BackendLoader>,
    cache: Arc<BackendCache>,
    dispatcher: InferenceDispatcher,
    annotator: Annotator,
    stats: StatsManager,
}

impl std::fmt::Debug for ProcessingOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingOrchestrator")
            .field("cache", &self.cache)
            .field("dispatcher", &self.dispatcher)
            .field("annotator", &self.annotator)
            .finish_non_exhaustive()
    }
}

impl ProcessingOrchestrator {
    /// Builds an orchestrator that loads every backend with ONNX Runtime.
    pub fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        Self::with_loader(config, Arc::new(OrtBackendLoader::from_config(config)))
    }

    /// Builds an orchestrator around a custom backend loader.
    pub fn with_loader(
        config: &PipelineConfig,
        loader: Arc<dyn BackendLoader>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let registry = StrategyRegistry::with_defaults(&config.detection)?;
        let dispatcher = InferenceDispatcher::new(registry, config.inference_timeout());
        let annotator = Annotator::new(config.annotation.clone());
        Ok(Self::with_parts(
            loader,
            Arc::new(BackendCache::new()),
            dispatcher,
            annotator,
        ))
    }

    /// Assembles an orchestrator from its parts.
    ///
    /// The cache may be shared between orchestrators that use the same loader.
    pub fn with_parts(
        loader: Arc<dyn BackendLoader>,
        cache: Arc<BackendCache>,
        dispatcher: InferenceDispatcher,
        annotator: Annotator,
    ) -> Self {
        Self {
            loader,
            cache,
            dispatcher,
            annotator,
            stats: StatsManager::new(),
        }
    }

    pub fn cache(&self) -> &BackendCache {
        &self.cache
    }

    pub fn dispatcher(&self) -> &InferenceDispatcher {
        &self.dispatcher
    }

    pub fn annotator(&self) -> &Annotator {
        &self.annotator
    }

    /// Counters of every request handled so far.
    pub fn stats(&self) -> ProcessingStats {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Resolves `model_id` and processes `asset` with it.
    pub fn process_model(
        &self,
        asset: &mut ImageAsset,
        model_id: &ModelId,
        resolver: &dyn ModelDescriptorResolver,
    ) -> Result<ProcessedArtifact, ProcessingFailure> {
        match resolver.resolve(model_id) {
            Ok(descriptor) => self.process(asset, &descriptor),
            Err(err) => Err(self.fail(asset, model_id, PipelineState::Loading, err)),
        }
    }

    /// Processes `asset` with the model described by `descriptor`.
    ///
    /// On success the asset is marked processed and the artifact is returned
    /// for the caller to persist. On failure the asset is left untouched.
    pub fn process(
        &self,
        asset: &mut ImageAsset,
        descriptor: &ModelDescriptor,
    ) -> Result<ProcessedArtifact, ProcessingFailure> {
        let start = Instant::now();
        let mut stage = PipelineState::Idle;
        debug!(
            image_id = asset.id(),
            model_id = %descriptor.id,
            bytes = asset.byte_size(),
            "processing started"
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_stages(asset, descriptor, start, &mut stage)
        }))
        .unwrap_or_else(|payload| {
            Err(stage_panic(
                stage,
                descriptor,
                &panic_message(payload.as_ref()),
            ))
        });

        match outcome {
            Ok(artifact) => {
                asset.mark_processed();
                self.stats.record_success(artifact.duration);
                info!(
                    image_id = %artifact.image_id,
                    model_id = %artifact.model_id,
                    stage = %PipelineState::Done,
                    elapsed_ms = artifact.duration.as_millis() as u64,
                    bytes = artifact.byte_size(),
                    "image processed"
                );
                Ok(artifact)
            }
            Err(err) => Err(self.fail(asset, &descriptor.id, stage, err)),
        }
    }

    fn run_stages(
        &self,
        asset: &ImageAsset,
        descriptor: &ModelDescriptor,
        start: Instant,
        stage: &mut PipelineState,
    ) -> Result<ProcessedArtifact, PipelineError> {
        let mut timings = StageTimings::default();

        *stage = stage.next();
        let t = Instant::now();
        descriptor.validate()?;
        let strategy = self.dispatcher.strategy_for(descriptor)?;
        let backend = self.cache.get_or_load(descriptor, self.loader.as_ref())?;
        timings.loading = t.elapsed();

        *stage = stage.next();
        let t = Instant::now();
        let image = Arc::new(decode_image(asset.bytes(), asset.format_tag())?);
        let result = self
            .dispatcher
            .run_strategy(strategy, backend, Arc::clone(&image))?;
        timings.inference = t.elapsed();

        *stage = stage.next();
        let t = Instant::now();
        let annotated = self.annotator.annotate(&image, &result, descriptor)?;
        timings.annotation = t.elapsed();

        *stage = stage.next();
        let t = Instant::now();
        let bytes = encode_jpeg(&annotated, self.annotator.config().jpeg_quality)?;
        timings.encoding = t.elapsed();

        Ok(ProcessedArtifact {
            image_id: asset.id().to_string(),
            model_id: descriptor.id.clone(),
            bytes,
            output_format: OutputFormat::Jpeg,
            duration: start.elapsed(),
            timings,
        })
    }

    fn fail(
        &self,
        asset: &ImageAsset,
        model_id: &ModelId,
        stage: PipelineState,
        error: PipelineError,
    ) -> ProcessingFailure {
        self.stats.record_failure(stage);
        error!(
            image_id = asset.id(),
            model_id = %model_id,
            stage = %stage,
            error = %error,
            "processing failed"
        );
        ProcessingFailure {
            image_id: asset.id().to_string(),
            model_id: model_id.to_string(),
            stage,
            error,
        }
    }
}

fn stage_panic(stage: PipelineState, descriptor: &ModelDescriptor, message: &str) -> PipelineError {
    let context = format!("{stage} panicked: {message}");
    match stage {
        PipelineState::Loading => PipelineError::model_load(
            descriptor
                .weights
                .as_ref()
                .map_or_else(|| descriptor.id.to_string(), |w| w.describe()),
            context,
            None,
        ),
        PipelineState::Inferring => PipelineError::inference_msg(&descriptor.name, context),
        _ => PipelineError::encoding_msg(context),
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
