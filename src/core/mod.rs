//! The core module of the pipeline.
//!
//! This module contains the fundamental components every stage builds on:
//! - Configuration management
//! - Constants used throughout the pipeline
//! - Error handling
//! - ONNX Runtime integration and tensor types
//! - The backend and strategy traits
//!
//! It also provides re-exports of commonly used types and functions for convenience.

pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;
pub mod traits;

pub use config::{
    AnnotationConfig, DetectionConfig, LandmarkConfig, OrtExecutionProvider,
    OrtGraphOptimizationLevel, OrtSessionConfig, PipelineConfig,
};
pub use constants::*;
pub use errors::{BoxedError, PipelineError, PipelineResult, ProcessingFailure};
pub use inference::{OrtInfer, Tensor4D, TensorOutputs, load_session};
pub use traits::{Backend, BackendInput, InferenceStrategy};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
