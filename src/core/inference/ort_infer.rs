//! ONNX Runtime inference engine shared by every backend.

use crate::core::errors::PipelineError;
use ort::{session::Session, value::ValueType};
use std::sync::Mutex;

#[path = "ort_infer_builders.rs"]
mod ort_infer_builders;
#[path = "ort_infer_execution.rs"]
mod ort_infer_execution;
#[cfg(test)]
#[path = "ort_infer_tests.rs"]
mod ort_infer_tests;

/// A single ONNX Runtime session with its port names resolved up front.
///
/// `Session::run` needs exclusive access, so the session sits behind a mutex;
/// concurrent callers of the same model serialize on it.
pub struct OrtInfer {
    pub(super) session: Mutex<Session>,
    pub(super) input_name: String,
    pub(super) output_names: Vec<String>,
    pub(super) input_shape: Option<Vec<i64>>,
    pub(super) model_name: String,
    pub(super) location: String,
}

impl std::fmt::Debug for OrtInfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtInfer")
            .field("input_name", &self.input_name)
            .field("output_names", &self.output_names)
            .field("input_shape", &self.input_shape)
            .field("model_name", &self.model_name)
            .field("location", &self.location)
            .finish()
    }
}

impl OrtInfer {
    /// Returns the name of the input port the engine feeds.
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Returns the names of every output port, in session order.
    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }

    /// Returns the declared shape of the primary input. Dynamic dimensions are negative.
    pub fn primary_input_shape(&self) -> Option<&[i64]> {
        self.input_shape.as_deref()
    }

    /// Returns the declared `(height, width)` of an NCHW input, if both are fixed.
    pub fn input_spatial_size(&self) -> Option<(u32, u32)> {
        match self.input_shape.as_deref() {
            Some([_, _, h, w]) if *h > 0 && *w > 0 => Some((*h as u32, *w as u32)),
            _ => None,
        }
    }

    /// Returns the model name used in logs and errors.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub(super) fn from_session(
        session: Session,
        model_name: String,
        location: String,
    ) -> Result<Self, PipelineError> {
        let input = session.inputs.first().ok_or_else(|| {
            PipelineError::model_load(&location, "model declares no inputs", None)
        })?;
        let input_name = input.name.clone();
        let input_shape = match &input.input_type {
            ValueType::Tensor { shape, .. } => Some(shape.iter().copied().collect()),
            _ => None,
        };
        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        if output_names.is_empty() {
            return Err(PipelineError::model_load(
                &location,
                "model declares no outputs",
                None,
            ));
        }

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_names,
            input_shape,
            model_name,
            location,
        })
    }
}
