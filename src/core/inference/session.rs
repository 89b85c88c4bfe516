//! Helpers for creating ONNX Runtime sessions.

use crate::core::config::{OrtExecutionProvider, OrtGraphOptimizationLevel, OrtSessionConfig};
use crate::core::errors::PipelineError;
use ort::execution_providers::ExecutionProviderDispatch;
use ort::logging::LogLevel;
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use std::path::Path;

/// Where a session's graph is read from.
#[derive(Debug, Clone, Copy)]
pub enum ModelSource<'a> {
    /// A model file on disk.
    File(&'a Path),
    /// A serialized model held in memory.
    Memory(&'a [u8]),
}

impl ModelSource<'_> {
    /// Human-readable description used in errors and logs.
    pub fn describe(&self) -> String {
        match self {
            ModelSource::File(path) => path.display().to_string(),
            ModelSource::Memory(bytes) => format!("<memory: {} bytes>", bytes.len()),
        }
    }
}

/// Creates a session builder with the given configuration applied.
pub fn session_builder(config: Option<&OrtSessionConfig>) -> Result<SessionBuilder, ort::Error> {
    let builder = Session::builder()?.with_log_level(LogLevel::Error)?;
    match config {
        Some(cfg) => apply_ort_config(builder, cfg),
        None => Ok(builder),
    }
}

/// Builds a session from a file or an in-memory graph.
pub fn load_session(
    source: ModelSource<'_>,
    config: Option<&OrtSessionConfig>,
) -> Result<Session, PipelineError> {
    let location = source.describe();
    let builder = session_builder(config).map_err(|e| {
        PipelineError::model_load_source(&location, "failed to configure ONNX session", e)
    })?;

    let session = match source {
        ModelSource::File(path) => builder.commit_from_file(path),
        ModelSource::Memory(bytes) => builder.commit_from_memory(bytes),
    };
    session.map_err(|e| {
        PipelineError::model_load_source(&location, "failed to create ONNX session", e)
    })
}

fn apply_ort_config(
    mut builder: SessionBuilder,
    cfg: &OrtSessionConfig,
) -> Result<SessionBuilder, ort::Error> {
    if let Some(intra) = cfg.intra_threads {
        builder = builder.with_intra_threads(intra)?;
    }
    if let Some(inter) = cfg.inter_threads {
        builder = builder.with_inter_threads(inter)?;
    }
    if let Some(level) = cfg.optimization_level {
        let mapped = match level {
            OrtGraphOptimizationLevel::DisableAll => GraphOptimizationLevel::Disable,
            OrtGraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
            OrtGraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
            OrtGraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        };
        builder = builder.with_optimization_level(mapped)?;
    }
    if let Some(enable) = cfg.enable_mem_pattern {
        builder = builder.with_memory_pattern(enable)?;
    }
    if cfg.execution_providers.is_some() {
        let providers = build_execution_providers(&cfg.get_execution_providers());
        if !providers.is_empty() {
            builder = builder.with_execution_providers(providers)?;
        }
    }
    Ok(builder)
}

fn build_execution_providers(eps: &[OrtExecutionProvider]) -> Vec<ExecutionProviderDispatch> {
    let mut providers = Vec::new();

    for ep in eps {
        match ep {
            OrtExecutionProvider::CPU => {
                providers.push(ort::execution_providers::CPUExecutionProvider::default().build());
            }
            #[cfg(feature = "cuda")]
            OrtExecutionProvider::CUDA { device_id } => {
                let mut cuda = ort::execution_providers::CUDAExecutionProvider::default();
                if let Some(id) = device_id {
                    cuda = cuda.with_device_id(*id);
                }
                providers.push(cuda.build());
            }
            #[cfg(feature = "tensorrt")]
            OrtExecutionProvider::TensorRT {
                device_id,
                fp16_enable,
            } => {
                let mut trt = ort::execution_providers::TensorRTExecutionProvider::default();
                if let Some(id) = device_id {
                    trt = trt.with_device_id(*id);
                }
                if let Some(fp16) = fp16_enable {
                    trt = trt.with_fp16(*fp16);
                }
                providers.push(trt.build());
            }
            #[cfg(feature = "coreml")]
            OrtExecutionProvider::CoreML => {
                providers.push(
                    ort::execution_providers::CoreMLExecutionProvider::default().build(),
                );
            }
            #[allow(unreachable_patterns)]
            other => {
                tracing::warn!(
                    "Execution provider {:?} requested but its feature is not enabled; skipping",
                    other
                );
            }
        }
    }

    providers
}
