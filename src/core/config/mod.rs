//! Configuration types for the pipeline and the ONNX Runtime sessions it creates.

pub mod onnx;
pub mod pipeline;

pub use onnx::{OrtExecutionProvider, OrtGraphOptimizationLevel, OrtSessionConfig};
pub use pipeline::{AnnotationConfig, DetectionConfig, LandmarkConfig, PipelineConfig};
