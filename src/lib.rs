//! # DeepSight
//!
//! Runs a registered model over an uploaded image and returns an annotated
//! JPEG. Every model format is served by ONNX Runtime.
//!
//! ## Features
//!
//! - Object detection with letterboxing, class-aware NMS and labeled boxes
//! - Age, gender and emotion classification with a caption band
//! - Hand and pose landmarks drawn as skeletons
//! - Process-wide backend cache with one load per model
//! - Per-call inference timeout and panic containment
//!
//! ## Modules
//!
//! * [`core`] - Configuration, errors, ONNX Runtime integration and trait seams
//! * [`domain`] - Assets, descriptors, results and artifacts
//! * [`models`] - Inference strategies per model family
//! * [`pipeline`] - Loading, dispatch, annotation and orchestration
//! * [`processors`] - Letterbox, normalization, NMS and top-k helpers
//! * [`utils`] - Image codecs and drawing helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deepsight::prelude::*;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! deepsight::init_tracing();
//!
//! let orchestrator = ProcessingOrchestrator::new(&PipelineConfig::default())?;
//! let descriptor = ModelDescriptor::new(
//!     "1",
//!     "YOLOv11x Object Detection",
//!     "yolo",
//!     Some(WeightsLocation::from(PathBuf::from("models/yolo11x"))),
//! );
//!
//! let mut asset = ImageAsset::new("street", std::fs::read("street.jpg")?, "jpg");
//! let artifact = orchestrator.process(&mut asset, &descriptor)?;
//!
//! let store = InMemoryArtifactStore::new();
//! store.save(artifact)?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod models;
pub mod pipeline;
pub mod processors;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::core::init_tracing;

/// Prelude module for convenient imports.
///
/// Included items cover running the pipeline end to end:
/// - Configuration (`PipelineConfig`)
/// - Records (`ImageAsset`, `ModelDescriptor`, `ModelId`, `WeightsLocation`, `ProcessedArtifact`)
/// - Orchestration (`ProcessingOrchestrator`, `ModelCatalog`, `ArtifactStore`)
/// - Errors (`PipelineError`, `ProcessingFailure`)
///
/// Extension points such as custom backends or strategies live in
/// `deepsight::core::traits` and `deepsight::pipeline`.
pub mod prelude {
    pub use crate::core::{PipelineConfig, PipelineError, PipelineResult, ProcessingFailure};
    pub use crate::domain::{
        ImageAsset, ModelDescriptor, ModelId, ProcessedArtifact, RawResult, WeightsLocation,
    };
    pub use crate::pipeline::{
        ArtifactStore, InMemoryArtifactStore, ModelCatalog, ModelDescriptorResolver,
        PipelineState, ProcessingOrchestrator,
    };
}
