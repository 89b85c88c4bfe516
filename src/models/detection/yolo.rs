//! YOLO object detector.
//!
//! Images are letterboxed onto a square canvas and scaled to `[0, 1]`. The
//! exported graph emits one tensor of shape `[1, 4 + C, N]` (or its transpose
//! `[1, N, 4 + C]`) where each of the `N` candidates carries a center-size box
//! in canvas pixels followed by `C` class scores.

use crate::core::config::DetectionConfig;
use crate::core::constants::LETTERBOX_FILL;
use crate::core::errors::PipelineError;
use crate::core::inference::Tensor4D;
use crate::core::traits::{Backend, BackendInput, InferenceStrategy};
use crate::domain::{BoundingBox, Detection, ModelKind, RawResult, labels::COCO_CLASSES};
use crate::processors::{ColorOrder, Letterbox, LetterboxInfo, NormalizeImage, class_aware_nms};
use image::RgbImage;
use ndarray::{ArrayD, ArrayView2, Axis, Ix2};

/// Postprocessing thresholds.
#[derive(Debug, Clone)]
pub struct YoloPostprocessConfig {
    /// Minimum class score.
    pub score_threshold: f32,
    /// Same-class IoU above which the weaker box is dropped.
    pub iou_threshold: f32,
    /// Maximum boxes kept.
    pub max_detections: usize,
}

impl From<&DetectionConfig> for YoloPostprocessConfig {
    fn from(config: &DetectionConfig) -> Self {
        Self {
            score_threshold: config.score_threshold,
            iou_threshold: config.iou_threshold,
            max_detections: config.max_detections,
        }
    }
}

/// Inference strategy for the YOLO detector family.
#[derive(Debug)]
pub struct YoloDetector {
    letterbox: Letterbox,
    normalizer: NormalizeImage,
    postprocess: YoloPostprocessConfig,
}

impl YoloDetector {
    pub fn new(config: &DetectionConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            letterbox: Letterbox::new(config.input_size, LETTERBOX_FILL),
            normalizer: NormalizeImage::unit_scale(ColorOrder::Rgb)?,
            postprocess: config.into(),
        })
    }

    /// Letterboxes and normalizes the image.
    pub fn preprocess(&self, image: &RgbImage) -> Result<(Tensor4D, LetterboxInfo), PipelineError> {
        let (canvas, info) = self.letterbox.apply(image);
        let tensor = self.normalizer.normalize_to(&canvas)?;
        Ok((tensor, info))
    }

    /// Decodes the raw output into detections in source pixels.
    pub fn decode(
        &self,
        output: &ArrayD<f32>,
        info: &LetterboxInfo,
        labels: &[String],
    ) -> Result<Vec<Detection>, PipelineError> {
        let rows = candidate_rows(output, labels.len())?;
        let num_classes = rows.ncols().saturating_sub(4);
        if num_classes == 0 {
            return Err(PipelineError::inference_msg(
                ModelKind::ObjectDetection.canonical_name(),
                format!("output shape {:?} carries no class scores", output.shape()),
            ));
        }

        let mut candidates = Vec::new();
        for row in rows.outer_iter() {
            let Some((class_id, score)) = row
                .iter()
                .skip(4)
                .copied()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(&b.1))
            else {
                continue;
            };
            if score.is_nan() || score < self.postprocess.score_threshold {
                continue;
            }

            let canvas_box = BoundingBox::from_center(row[0], row[1], row[2], row[3]);
            let bbox = info.unmap(&canvas_box);
            if bbox.area() <= 0.0 {
                continue;
            }

            let label = labels
                .get(class_id)
                .cloned()
                .unwrap_or_else(|| format!("class_{class_id}"));
            candidates.push(Detection {
                bbox,
                class_id,
                label,
                score,
            });
        }

        Ok(class_aware_nms(
            candidates,
            self.postprocess.iou_threshold,
            self.postprocess.max_detections,
        ))
    }
}

/// Views the output as `[N, 4 + C]` rows, transposing channel-first exports.
fn candidate_rows(
    output: &ArrayD<f32>,
    num_labels: usize,
) -> Result<ArrayView2<'_, f32>, PipelineError> {
    let squeezed = match output.ndim() {
        3 if output.shape()[0] == 1 => output.index_axis(Axis(0), 0),
        2 => output.view(),
        _ => {
            return Err(PipelineError::inference_msg(
                ModelKind::ObjectDetection.canonical_name(),
                format!("unexpected output shape {:?}", output.shape()),
            ));
        }
    };
    let view = squeezed.into_dimensionality::<Ix2>()?;
    let (a, b) = view.dim();

    let channels_first = if a == num_labels + 4 {
        true
    } else if b == num_labels + 4 {
        false
    } else {
        a < b
    };
    Ok(if channels_first { view.reversed_axes() } else { view })
}

impl InferenceStrategy for YoloDetector {
    fn kind(&self) -> ModelKind {
        ModelKind::ObjectDetection
    }

    fn infer(&self, backend: &dyn Backend, image: &RgbImage) -> Result<RawResult, PipelineError> {
        let (tensor, info) = self.preprocess(image)?;
        let outputs = backend.run(BackendInput::Tensor(tensor))?;
        let output = outputs.require_first(backend.name())?;

        let labels: Vec<String> = match backend.class_names() {
            Some(names) if !names.is_empty() => names.to_vec(),
            _ => COCO_CLASSES.iter().map(|s| s.to_string()).collect(),
        };
        let detections = self.decode(output, &info, &labels)?;
        tracing::debug!(
            model = backend.name(),
            detections = detections.len(),
            "decoded detector output"
        );

        if detections.is_empty() {
            Ok(RawResult::Empty)
        } else {
            Ok(RawResult::Detections(detections))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelFormat;
    use crate::testing::{FakeBackend, single_output, yolo_single_box};

    fn detector() -> YoloDetector {
        YoloDetector::new(&DetectionConfig::default()).unwrap()
    }

    #[test]
    fn test_single_cat_maps_back_to_source_pixels() {
        let backend = FakeBackend::new(
            ModelFormat::Detector,
            yolo_single_box(55.0, 135.0, 90.0, 90.0, 15, 0.92),
        );
        let image = RgbImage::new(640, 480);
        let result = detector().infer(&backend, &image).unwrap();

        let RawResult::Detections(dets) = result else {
            panic!("expected detections, got {result:?}");
        };
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "cat");
        assert!((dets[0].score - 0.92).abs() < 1e-6);
        let b = dets[0].bbox;
        assert!((b.x1 - 10.0).abs() < 1e-3 && (b.y1 - 10.0).abs() < 1e-3);
        assert!((b.x2 - 100.0).abs() < 1e-3 && (b.y2 - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_below_threshold_is_empty() {
        let backend = FakeBackend::new(
            ModelFormat::Detector,
            yolo_single_box(55.0, 135.0, 90.0, 90.0, 15, 0.1),
        );
        let result = detector().infer(&backend, &RgbImage::new(640, 480)).unwrap();
        assert_eq!(result, RawResult::Empty);
    }

    #[test]
    fn test_transposed_output_and_bundle_labels() {
        let mut data = vec![320.0, 320.0, 64.0, 64.0, 0.1, 0.8];
        data.extend([100.0, 100.0, 20.0, 20.0, 0.7, 0.2]);
        let mut backend = FakeBackend::new(ModelFormat::Detector, single_output(&[1, 2, 6], data));
        backend.class_names = Some(vec!["helmet".into(), "vest".into()]);

        let result = detector().infer(&backend, &RgbImage::new(640, 640)).unwrap();
        let RawResult::Detections(dets) = result else {
            panic!("expected detections");
        };
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].label, "vest");
        assert_eq!(dets[1].label, "helmet");
    }

    #[test]
    fn test_bad_rank_is_inference_error() {
        let backend = FakeBackend::new(ModelFormat::Detector, single_output(&[84], vec![0.0; 84]));
        let err = detector().infer(&backend, &RgbImage::new(32, 32)).unwrap_err();
        assert!(matches!(err, PipelineError::Inference { .. }));
    }
}
