//! Error types for the inference pipeline.
//!
//! Every layer below the orchestrator returns [`PipelineError`]. The
//! orchestrator is the only component that wraps an error into a
//! [`ProcessingFailure`] for the caller, attaching the image, the model and the
//! stage where processing stopped.

use crate::pipeline::state::PipelineState;
use thiserror::Error;

/// Boxed error used as the source of backend-specific failures.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised inside the pipeline boundary.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No descriptor is registered under the requested model id.
    #[error("model '{model_id}' not found")]
    NotFound {
        /// The id that failed to resolve.
        model_id: String,
    },

    /// The descriptor's format tag is not one of the supported formats.
    #[error("unsupported model format '{tag}'")]
    UnsupportedFormat {
        /// The format tag as registered.
        tag: String,
    },

    /// The format is supported but no inference strategy exists for this model.
    #[error("no inference strategy for model '{model}' with format '{format}'")]
    UnsupportedModel {
        /// Symbolic model name.
        model: String,
        /// Parsed format tag.
        format: String,
    },

    /// Backend construction failed.
    #[error("failed to load model from '{location}': {message}")]
    ModelLoad {
        /// Where the weights were read from.
        location: String,
        /// What went wrong.
        message: String,
        /// The runtime error, if any.
        #[source]
        source: Option<BoxedError>,
    },

    /// Backend invocation failed or timed out.
    #[error("inference failed for model '{model}': {context}")]
    Inference {
        /// Model that was running.
        model: String,
        /// Description of the failure.
        context: String,
        /// The runtime error, if any.
        #[source]
        source: Option<BoxedError>,
    },

    /// The source image bytes could not be decoded.
    #[error("invalid image: {context}")]
    InvalidImage {
        /// Description of the failure.
        context: String,
        /// The decoder error.
        #[source]
        source: Option<image::ImageError>,
    },

    /// Rendering the overlay or encoding the output failed.
    #[error("encoding failed: {context}")]
    Encoding {
        /// Description of the failure.
        context: String,
        /// The underlying error, if any.
        #[source]
        source: Option<BoxedError>,
    },

    /// Invalid configuration value.
    #[error("configuration: {message}")]
    Config {
        /// A message describing the configuration error.
        message: String,
    },

    /// Tensor reshaping failed.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Convenient result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Creates a [`PipelineError::NotFound`] for the given model id.
    pub fn not_found(model_id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            model_id: model_id.to_string(),
        }
    }

    /// Creates a [`PipelineError::UnsupportedFormat`] for the given tag.
    pub fn unsupported_format(tag: impl Into<String>) -> Self {
        Self::UnsupportedFormat { tag: tag.into() }
    }

    /// Creates a [`PipelineError::ModelLoad`].
    ///
    /// # Arguments
    ///
    /// * `location` - Where the weights were read from.
    /// * `message` - What went wrong.
    /// * `source` - Optional runtime error that caused the failure.
    pub fn model_load(
        location: impl std::fmt::Display,
        message: impl Into<String>,
        source: Option<BoxedError>,
    ) -> Self {
        Self::ModelLoad {
            location: location.to_string(),
            message: message.into(),
            source,
        }
    }

    /// Creates a [`PipelineError::ModelLoad`] caused by a runtime error.
    pub fn model_load_source(
        location: impl std::fmt::Display,
        message: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::model_load(location, message, Some(Box::new(error) as BoxedError))
    }

    /// Creates a [`PipelineError::Inference`] wrapping a runtime error.
    pub fn inference(
        model: &str,
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model: model.to_string(),
            context: context.into(),
            source: Some(Box::new(error) as BoxedError),
        }
    }

    /// Creates a [`PipelineError::Inference`] without an underlying error.
    pub fn inference_msg(model: &str, context: impl Into<String>) -> Self {
        Self::Inference {
            model: model.to_string(),
            context: context.into(),
            source: None,
        }
    }

    /// Creates a [`PipelineError::InvalidImage`].
    pub fn invalid_image(context: impl Into<String>, source: Option<image::ImageError>) -> Self {
        Self::InvalidImage {
            context: context.into(),
            source,
        }
    }

    /// Creates a [`PipelineError::Encoding`] wrapping an error.
    pub fn encoding(
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Encoding {
            context: context.into(),
            source: Some(Box::new(error) as BoxedError),
        }
    }

    /// Creates a [`PipelineError::Encoding`] without an underlying error.
    pub fn encoding_msg(context: impl Into<String>) -> Self {
        Self::Encoding {
            context: context.into(),
            source: None,
        }
    }

    /// Creates a [`PipelineError::Config`].
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a configuration error naming the offending field.
    pub fn config_error_with_context(field: &str, value: &str, reason: &str) -> Self {
        Self::Config {
            message: format!(
                "Configuration error in field '{}' with value '{}': {}",
                field, value, reason
            ),
        }
    }

    /// Returns true if the error came from the inference stage timing out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Inference { context, .. } if context.starts_with("timed out"))
    }
}

/// The single failure signal the orchestrator returns to its caller.
///
/// The source asset is never modified when this is returned and no artifact
/// exists for the attempt.
#[derive(Error, Debug)]
#[error("processing failed for image '{image_id}' with model '{model_id}' during {stage}")]
pub struct ProcessingFailure {
    /// Source image.
    pub image_id: String,
    /// Model that was requested.
    pub model_id: String,
    /// State the orchestrator was in when the failure occurred.
    pub stage: PipelineState,
    /// The typed cause.
    #[source]
    pub error: PipelineError,
}

impl ProcessingFailure {
    /// Returns the typed cause.
    pub fn error(&self) -> &PipelineError {
        &self.error
    }

    /// Consumes the failure and returns the typed cause.
    pub fn into_error(self) -> PipelineError {
        self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_load_message_includes_location() {
        let err = PipelineError::model_load("models/yolo", "missing model.onnx", None);
        assert_eq!(
            err.to_string(),
            "failed to load model from 'models/yolo': missing model.onnx"
        );
    }

    #[test]
    fn test_timeout_detection() {
        let err = PipelineError::inference_msg("age", "timed out after 10ms");
        assert!(err.is_timeout());
        let err = PipelineError::inference_msg("age", "backend panicked");
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_failure_exposes_source() {
        let failure = ProcessingFailure {
            image_id: "7".to_string(),
            model_id: "3".to_string(),
            stage: PipelineState::Loading,
            error: PipelineError::unsupported_format("caffe"),
        };
        assert_eq!(
            failure.to_string(),
            "processing failed for image '7' with model '3' during loading"
        );
        assert!(matches!(
            failure.error(),
            PipelineError::UnsupportedFormat { tag } if tag == "caffe"
        ));
        let source = std::error::Error::source(&failure).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("unsupported model format 'caffe'"));
    }
}
