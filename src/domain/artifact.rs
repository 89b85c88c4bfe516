//! Processed output artifacts.

use super::descriptor::ModelId;
use std::fmt;
use std::time::Duration;

/// Encoding of the canonical output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Baseline JPEG.
    #[default]
    Jpeg,
}

impl OutputFormat {
    /// Upper-case tag stored with the artifact.
    pub fn tag(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "JPEG",
        }
    }

    /// MIME type of the encoded bytes.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Wall-clock time spent in each processing stage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimings {
    pub loading: Duration,
    pub inference: Duration,
    pub annotation: Duration,
    pub encoding: Duration,
}

/// The annotated image derived from one asset by one model.
#[derive(Debug, Clone)]
pub struct ProcessedArtifact {
    /// Source asset.
    pub image_id: String,
    /// Model that produced it.
    pub model_id: ModelId,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// Encoding of `bytes`.
    pub output_format: OutputFormat,
    /// Total processing time, from request to encoded output.
    pub duration: Duration,
    /// Per-stage breakdown of `duration`.
    pub timings: StageTimings,
}

impl ProcessedArtifact {
    /// Size of the encoded bytes.
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }
}
