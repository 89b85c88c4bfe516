//! Tensor types exchanged with backends.

use crate::core::errors::PipelineError;
use ndarray::{Array4, ArrayD};

/// A batch of NCHW `f32` images.
pub type Tensor4D = Array4<f32>;

/// Named output tensors of one backend invocation, in session order.
#[derive(Debug, Clone, Default)]
pub struct TensorOutputs {
    tensors: Vec<(String, ArrayD<f32>)>,
}

impl TensorOutputs {
    /// Creates an empty output set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a named tensor.
    pub fn push(&mut self, name: impl Into<String>, tensor: ArrayD<f32>) {
        self.tensors.push((name.into(), tensor));
    }

    /// Builder-style variant of [`TensorOutputs::push`].
    pub fn with(mut self, name: impl Into<String>, tensor: ArrayD<f32>) -> Self {
        self.push(name, tensor);
        self
    }

    /// Looks a tensor up by name.
    pub fn get(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.tensors
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    /// Returns the first output.
    pub fn first(&self) -> Option<&ArrayD<f32>> {
        self.tensors.first().map(|(_, t)| t)
    }

    /// Looks a tensor up by name, failing with an inference error naming the model.
    pub fn require(&self, name: &str, model: &str) -> Result<&ArrayD<f32>, PipelineError> {
        self.get(name).ok_or_else(|| {
            PipelineError::inference_msg(
                model,
                format!(
                    "backend produced no '{}' output (available: {:?})",
                    name,
                    self.names()
                ),
            )
        })
    }

    /// Returns the first output, failing with an inference error naming the model.
    pub fn require_first(&self, model: &str) -> Result<&ArrayD<f32>, PipelineError> {
        self.first()
            .ok_or_else(|| PipelineError::inference_msg(model, "backend produced no outputs"))
    }

    /// Returns the output names.
    pub fn names(&self) -> Vec<&str> {
        self.tensors.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Returns the number of outputs.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Returns true if there are no outputs.
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn test_lookup_by_name_and_order() {
        let outputs = TensorOutputs::new()
            .with("boxes", ArrayD::zeros(IxDyn(&[1, 4])))
            .with("scores", ArrayD::zeros(IxDyn(&[1])));

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs.names(), vec!["boxes", "scores"]);
        assert_eq!(outputs.first().unwrap().shape(), &[1, 4]);
        assert_eq!(outputs.get("scores").unwrap().shape(), &[1]);
        assert!(outputs.get("missing").is_none());
    }

    #[test]
    fn test_require_missing_output_is_inference_error() {
        let outputs = TensorOutputs::new();
        assert!(outputs.is_empty());
        let err = outputs.require("landmarks", "hand").unwrap_err();
        assert!(matches!(err, PipelineError::Inference { .. }));
        assert!(outputs.require_first("hand").is_err());
    }
}
