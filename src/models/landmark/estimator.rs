//! Landmark strategy: pairs pipeline output with the model's topology.

use crate::core::errors::PipelineError;
use crate::core::traits::{Backend, BackendInput, InferenceStrategy};
use crate::domain::{Landmark, LandmarkSet, ModelKind, RawResult, Topology};
use image::RgbImage;
use ndarray::Ix3;

/// Output port holding `[N, K, 3]` normalized points.
pub const LANDMARKS_OUTPUT: &str = "landmarks";
/// Output port holding `[N]` presence scores.
pub const SCORES_OUTPUT: &str = "scores";

/// Inference strategy for the landmark family.
#[derive(Debug)]
pub struct LandmarkEstimator {
    kind: ModelKind,
    topology: &'static Topology,
}

impl LandmarkEstimator {
    /// Creates the strategy, or `None` if `kind` has no landmark topology.
    pub fn new(kind: ModelKind) -> Option<Self> {
        kind.topology().map(|topology| Self { kind, topology })
    }
}

impl InferenceStrategy for LandmarkEstimator {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn infer(&self, backend: &dyn Backend, image: &RgbImage) -> Result<RawResult, PipelineError> {
        let outputs = backend.run(BackendInput::Image(image))?;
        let points = outputs
            .require(LANDMARKS_OUTPUT, backend.name())?
            .view()
            .into_dimensionality::<Ix3>()?;
        let scores = outputs.require(SCORES_OUTPUT, backend.name())?;

        let (sets, num_points, coords) = points.dim();
        if sets == 0 {
            return Ok(RawResult::Empty);
        }
        if num_points != self.topology.num_points || coords < 2 {
            return Err(PipelineError::inference_msg(
                backend.name(),
                format!(
                    "expected {} points per {} set, got shape {:?}",
                    self.topology.num_points,
                    self.topology.name,
                    points.shape()
                ),
            ));
        }
        if scores.len() != sets {
            return Err(PipelineError::inference_msg(
                backend.name(),
                format!("{} score(s) for {sets} landmark set(s)", scores.len()),
            ));
        }
        if let Some(bad) = points.iter().find(|v| !v.is_finite()) {
            return Err(PipelineError::inference_msg(
                backend.name(),
                format!("landmark output contains a non-finite coordinate ({bad})"),
            ));
        }

        let landmark_sets = points
            .outer_iter()
            .zip(scores.iter())
            .map(|(set, &score)| LandmarkSet {
                points: set
                    .outer_iter()
                    .map(|p| Landmark {
                        x: p[0],
                        y: p[1],
                        z: if coords > 2 { p[2] } else { 0.0 },
                    })
                    .collect(),
                topology: self.topology,
                score,
            })
            .collect();

        Ok(RawResult::Landmarks(landmark_sets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inference::TensorOutputs;
    use crate::domain::ModelFormat;
    use crate::testing::{FakeBackend, landmark_outputs};

    #[test]
    fn test_hand_sets_carry_topology() {
        let backend = FakeBackend::new(ModelFormat::Landmark, landmark_outputs(2, 21));
        let estimator = LandmarkEstimator::new(ModelKind::HandLandmarks).unwrap();
        let result = estimator.infer(&backend, &RgbImage::new(64, 64)).unwrap();
        let RawResult::Landmarks(sets) = result else {
            panic!("expected landmarks");
        };
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].points.len(), 21);
        assert_eq!(sets[0].topology.name, "hand");
    }

    #[test]
    fn test_point_count_mismatch_is_inference_error() {
        let backend = FakeBackend::new(ModelFormat::Landmark, landmark_outputs(1, 21));
        let estimator = LandmarkEstimator::new(ModelKind::PoseLandmarks).unwrap();
        let err = estimator.infer(&backend, &RgbImage::new(64, 64)).unwrap_err();
        assert!(matches!(err, PipelineError::Inference { .. }));
    }

    #[test]
    fn test_non_finite_coordinates_are_rejected() {
        let outputs = landmark_outputs(1, 21);
        let mut points = outputs.get("landmarks").unwrap().clone();
        points[[0, 3, 1]] = f32::NAN;
        let outputs = TensorOutputs::new()
            .with("landmarks", points)
            .with("scores", outputs.get("scores").unwrap().clone());
        let backend = FakeBackend::new(ModelFormat::Landmark, outputs);

        let estimator = LandmarkEstimator::new(ModelKind::HandLandmarks).unwrap();
        let err = estimator.infer(&backend, &RgbImage::new(64, 64)).unwrap_err();
        assert!(err.to_string().contains("non-finite"), "{err}");
    }

    #[test]
    fn test_no_sets_is_empty() {
        let backend = FakeBackend::new(ModelFormat::Landmark, landmark_outputs(0, 33));
        let estimator = LandmarkEstimator::new(ModelKind::PoseLandmarks).unwrap();
        assert_eq!(
            estimator.infer(&backend, &RgbImage::new(8, 8)).unwrap(),
            RawResult::Empty
        );
        assert!(LandmarkEstimator::new(ModelKind::AgeClassification).is_none());
    }
}
