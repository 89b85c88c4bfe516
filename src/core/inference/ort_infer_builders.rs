use super::*;
use crate::core::config::OrtSessionConfig;
use crate::core::inference::session::{ModelSource, load_session};
use std::path::Path;

impl OrtInfer {
    /// Creates an engine from a model file.
    pub fn from_file(
        model_path: impl AsRef<Path>,
        config: Option<&OrtSessionConfig>,
    ) -> Result<Self, PipelineError> {
        let path = model_path.as_ref();
        let session = load_session(ModelSource::File(path), config)?;
        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();
        Self::from_session(session, model_name, path.display().to_string())
    }

    /// Creates an engine from a serialized model held in memory.
    pub fn from_memory(
        bytes: &[u8],
        model_name: impl Into<String>,
        config: Option<&OrtSessionConfig>,
    ) -> Result<Self, PipelineError> {
        let source = ModelSource::Memory(bytes);
        let location = source.describe();
        let session = load_session(source, config)?;
        Self::from_session(session, model_name.into(), location)
    }
}
