//! The runnable model abstraction.

use crate::core::errors::PipelineError;
use crate::core::inference::{Tensor4D, TensorOutputs};
use crate::domain::ModelFormat;
use image::RgbImage;
use std::fmt::Debug;

/// Input handed to a backend.
///
/// Tensor backends take a preprocessed NCHW batch. Pipeline backends, such as
/// the bundled landmark pipeline, do their own preprocessing and take the
/// decoded image.
#[derive(Debug)]
pub enum BackendInput<'a> {
    /// Preprocessed NCHW tensor.
    Tensor(Tensor4D),
    /// Full-resolution RGB image.
    Image(&'a RgbImage),
}

impl BackendInput<'_> {
    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            BackendInput::Tensor(t) => format!("tensor {:?}", t.shape()),
            BackendInput::Image(img) => format!("image {}x{}", img.width(), img.height()),
        }
    }
}

/// A loaded model that can be invoked.
///
/// Backends are shared across requests through the backend cache, so they
/// must be usable from several threads at once.
pub trait Backend: Send + Sync + Debug {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Format the backend was loaded from.
    fn format(&self) -> ModelFormat;

    /// Runs one forward pass.
    fn run(&self, input: BackendInput<'_>) -> Result<TensorOutputs, PipelineError>;

    /// Class labels shipped with the model, if any.
    fn class_names(&self) -> Option<&[String]> {
        None
    }

    /// Fixed `(width, height)` input the model expects, if it declares one.
    fn input_size(&self) -> Option<(u32, u32)> {
        None
    }
}
