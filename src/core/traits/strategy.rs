//! Per-model pre- and post-processing.

use super::backend::Backend;
use crate::core::errors::PipelineError;
use crate::domain::{ModelFamily, ModelFormat, ModelKind, RawResult};
use image::RgbImage;
use std::fmt::Debug;

/// Turns an image into a [`RawResult`] using a backend.
///
/// Strategies hold no per-request state; one instance serves every request
/// for its model identity.
pub trait InferenceStrategy: Send + Sync + Debug {
    /// Model identity this strategy serves.
    fn kind(&self) -> ModelKind;

    /// Format of the backends this strategy drives.
    fn format(&self) -> ModelFormat {
        self.kind().format()
    }

    /// Output family, which must agree with the returned results.
    fn family(&self) -> ModelFamily {
        self.kind().family()
    }

    /// Preprocesses `image`, runs `backend` and decodes its outputs.
    fn infer(&self, backend: &dyn Backend, image: &RgbImage) -> Result<RawResult, PipelineError>;
}
