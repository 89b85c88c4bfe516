use super::*;
use crate::core::inference::tensor::{Tensor4D, TensorOutputs};
use ndarray::{ArrayD, IxDyn};
use ort::value::TensorRef;

impl OrtInfer {
    /// Returns the location the model was loaded from.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Runs the session on one NCHW tensor and extracts every output as `f32`.
    pub fn run(&self, x: &Tensor4D) -> Result<TensorOutputs, PipelineError> {
        let input_shape = x.shape().to_vec();

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            PipelineError::inference(
                &self.model_name,
                format!("failed to convert input tensor with shape {:?}", input_shape),
                e,
            )
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let mut session = self.session.lock().map_err(|_| {
            PipelineError::inference_msg(&self.model_name, "session lock poisoned")
        })?;

        let outputs = session.run(inputs).map_err(|e| {
            PipelineError::inference(
                &self.model_name,
                format!(
                    "forward pass failed for input '{}' with shape {:?}",
                    self.input_name, input_shape
                ),
                e,
            )
        })?;

        let mut extracted = TensorOutputs::new();
        for name in &self.output_names {
            let (shape, data) = outputs[name.as_str()]
                .try_extract_tensor::<f32>()
                .map_err(|e| {
                    PipelineError::inference(
                        &self.model_name,
                        format!("failed to extract output tensor '{}' as f32", name),
                        e,
                    )
                })?;
            let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
            let array = ArrayD::from_shape_vec(IxDyn(&dims), data.to_vec())?;
            extracted.push(name.clone(), array);
        }

        Ok(extracted)
    }

    /// Runs the session once on a zero tensor so the runtime allocates its
    /// execution buffers before the first real request.
    ///
    /// Inputs with dynamic spatial dimensions are left alone; their buffers
    /// depend on the request.
    pub fn warm_up(&self) -> Result<bool, PipelineError> {
        let Some(shape) = self.input_shape.as_deref() else {
            return Ok(false);
        };
        let [n, c, h, w] = shape else {
            return Ok(false);
        };
        if *c <= 0 || *h <= 0 || *w <= 0 {
            return Ok(false);
        }
        let batch = if *n > 0 { *n as usize } else { 1 };
        let zeros = Tensor4D::zeros((batch, *c as usize, *h as usize, *w as usize));
        self.run(&zeros)?;
        tracing::debug!(
            "Pre-allocated execution buffers for '{}' with input {:?}",
            self.model_name,
            zeros.shape()
        );
        Ok(true)
    }
}
