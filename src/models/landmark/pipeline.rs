//! Bundled two-stage landmark pipeline.
//!
//! A region detector proposes hands or bodies on the full image; each region
//! is expanded to a square crop and passed to the landmark regressor. Both
//! graphs ship in the configured assets directory as
//! `<topology>_detector.onnx` and `<topology>_landmarks.onnx`.
//!
//! Detector output: `[1, M, 5]` rows of `(x1, y1, x2, y2, score)` normalized
//! to the image. Regressor outputs: `[1, K * 3]` points in crop input pixels,
//! then an optional presence score.

use super::estimator::{LANDMARKS_OUTPUT, SCORES_OUTPUT};
use crate::core::config::{LandmarkConfig, OrtSessionConfig};
use crate::core::errors::PipelineError;
use crate::core::inference::{OrtInfer, TensorOutputs};
use crate::core::traits::{Backend, BackendInput};
use crate::domain::{BoundingBox, ModelFormat, Topology};
use crate::processors::{ColorOrder, NormalizeImage};
use image::{RgbImage, imageops};
use ndarray::{ArrayD, IxDyn};
use std::path::{Path, PathBuf};

const DEFAULT_DETECTOR_INPUT: (u32, u32) = (192, 192);
const DEFAULT_LANDMARK_INPUT: (u32, u32) = (224, 224);
/// Crops are this much larger than the detected region.
const REGION_EXPANSION: f32 = 1.5;
/// Regions overlapping a stronger one by more than this are dropped.
const REGION_IOU_THRESHOLD: f32 = 0.3;

/// File paths of a topology's pipeline graphs.
pub fn asset_paths(assets_dir: &Path, topology: &Topology) -> (PathBuf, PathBuf) {
    (
        assets_dir.join(format!("{}_detector.onnx", topology.name)),
        assets_dir.join(format!("{}_landmarks.onnx", topology.name)),
    )
}

/// A detector and a landmark regressor run back to back.
#[derive(Debug)]
pub struct LandmarkPipeline {
    name: String,
    topology: &'static Topology,
    detector: OrtInfer,
    regressor: OrtInfer,
    config: LandmarkConfig,
}

impl LandmarkPipeline {
    /// Loads both graphs for `topology` from `config.assets_dir`.
    pub fn load(
        topology: &'static Topology,
        config: &LandmarkConfig,
        ort_config: Option<&OrtSessionConfig>,
    ) -> Result<Self, PipelineError> {
        let (detector_path, regressor_path) = asset_paths(&config.assets_dir, topology);
        for path in [&detector_path, &regressor_path] {
            if !path.is_file() {
                return Err(PipelineError::model_load(
                    path.display(),
                    format!("{} landmark pipeline asset is missing", topology.name),
                    None,
                ));
            }
        }

        let detector = OrtInfer::from_file(&detector_path, ort_config)?;
        let regressor = OrtInfer::from_file(&regressor_path, ort_config)?;
        tracing::info!(
            topology = topology.name,
            assets = %config.assets_dir.display(),
            min_detection_confidence = config.min_detection_confidence,
            min_tracking_confidence = config.min_tracking_confidence,
            "loaded landmark pipeline"
        );

        Ok(Self {
            name: format!("{}-landmarks", topology.name),
            topology,
            detector,
            regressor,
            config: config.clone(),
        })
    }

    fn detect_regions(&self, image: &RgbImage) -> Result<Vec<(BoundingBox, f32)>, PipelineError> {
        let (h, w) = self
            .detector
            .input_spatial_size()
            .unwrap_or(DEFAULT_DETECTOR_INPUT);
        let resized = imageops::resize(image, w, h, imageops::FilterType::Triangle);
        let tensor = NormalizeImage::unit_scale(ColorOrder::Rgb)?.normalize_to(&resized)?;
        let outputs = self.detector.run(&tensor)?;
        let raw = outputs.require_first(&self.name)?;

        let rows: Vec<f32> = raw.iter().copied().collect();
        if rows.len() % 5 != 0 {
            return Err(PipelineError::inference_msg(
                &self.name,
                format!("region output shape {:?} is not a multiple of 5", raw.shape()),
            ));
        }
        let candidates = rows
            .chunks_exact(5)
            .map(|r| (BoundingBox::new(r[0], r[1], r[2], r[3]), r[4]))
            .collect();
        Ok(select_regions(
            candidates,
            self.config.min_detection_confidence,
            self.config.max_num_sets,
        ))
    }

    fn regress(
        &self,
        image: &RgbImage,
        region: &BoundingBox,
    ) -> Result<Option<(Vec<f32>, f32)>, PipelineError> {
        let (img_w, img_h) = image.dimensions();
        let crop = crop_window(region, img_w, img_h);
        if crop.width() < 1.0 || crop.height() < 1.0 {
            return Ok(None);
        }

        let patch = imageops::crop_imm(
            image,
            crop.x1 as u32,
            crop.y1 as u32,
            crop.width() as u32,
            crop.height() as u32,
        )
        .to_image();
        let (in_h, in_w) = self
            .regressor
            .input_spatial_size()
            .unwrap_or(DEFAULT_LANDMARK_INPUT);
        let resized = imageops::resize(&patch, in_w, in_h, imageops::FilterType::Triangle);
        let tensor = NormalizeImage::unit_scale(ColorOrder::Rgb)?.normalize_to(&resized)?;
        let outputs = self.regressor.run(&tensor)?;

        let raw: Vec<f32> = outputs.require_first(&self.name)?.iter().copied().collect();
        let expected = self.topology.num_points * 3;
        if raw.len() < expected {
            return Err(PipelineError::inference_msg(
                &self.name,
                format!("regressor produced {} values, expected {expected}", raw.len()),
            ));
        }
        let presence = outputs
            .names()
            .get(1)
            .and_then(|name| outputs.get(name))
            .and_then(|t| t.iter().next().copied())
            .unwrap_or(1.0);
        if presence < self.config.min_tracking_confidence {
            return Ok(None);
        }

        let points = map_points(
            &raw[..expected],
            &crop,
            (in_w as f32, in_h as f32),
            (img_w as f32, img_h as f32),
        );
        Ok(Some((points, presence)))
    }
}

/// Keeps confident regions, strongest first, dropping overlaps.
fn select_regions(
    mut candidates: Vec<(BoundingBox, f32)>,
    min_score: f32,
    max_regions: usize,
) -> Vec<(BoundingBox, f32)> {
    candidates.retain(|(b, s)| *s >= min_score && b.area() > 0.0);
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut kept: Vec<(BoundingBox, f32)> = Vec::new();
    for (bbox, score) in candidates {
        if kept.len() >= max_regions {
            break;
        }
        if kept.iter().all(|(k, _)| k.iou(&bbox) <= REGION_IOU_THRESHOLD) {
            kept.push((bbox, score));
        }
    }
    kept
}

/// Square pixel crop around a normalized region, clipped to the image.
fn crop_window(region: &BoundingBox, img_w: u32, img_h: u32) -> BoundingBox {
    let (w, h) = (img_w as f32, img_h as f32);
    let cx = (region.x1 + region.x2) / 2.0 * w;
    let cy = (region.y1 + region.y2) / 2.0 * h;
    let side = (region.width() * w).max(region.height() * h) * REGION_EXPANSION;
    let window = BoundingBox::from_center(cx, cy, side, side).clip(w, h);
    BoundingBox::new(
        window.x1.floor(),
        window.y1.floor(),
        window.x2.floor(),
        window.y2.floor(),
    )
}

/// Maps `(x, y, z)` triples from regressor input pixels to image-normalized
/// coordinates. `z` is scaled by the crop width like `x`.
fn map_points(raw: &[f32], crop: &BoundingBox, input: (f32, f32), image: (f32, f32)) -> Vec<f32> {
    let sx = crop.width() / input.0;
    let sy = crop.height() / input.1;
    raw.chunks_exact(3)
        .flat_map(|p| {
            [
                (crop.x1 + p[0] * sx) / image.0,
                (crop.y1 + p[1] * sy) / image.1,
                p[2] * sx / image.0,
            ]
        })
        .collect()
}

impl Backend for LandmarkPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> ModelFormat {
        ModelFormat::Landmark
    }

    fn run(&self, input: BackendInput<'_>) -> Result<TensorOutputs, PipelineError> {
        let BackendInput::Image(image) = input else {
            return Err(PipelineError::inference_msg(
                &self.name,
                format!("landmark pipeline takes an image, got {}", input.describe()),
            ));
        };

        let mut coords = Vec::new();
        let mut scores = Vec::new();
        for (region, _) in self.detect_regions(image)? {
            if let Some((points, presence)) = self.regress(image, &region)? {
                coords.extend(points);
                scores.push(presence);
            }
        }

        let sets = scores.len();
        Ok(TensorOutputs::new()
            .with(
                LANDMARKS_OUTPUT,
                ArrayD::from_shape_vec(IxDyn(&[sets, self.topology.num_points, 3]), coords)?,
            )
            .with(SCORES_OUTPUT, ArrayD::from_shape_vec(IxDyn(&[sets]), scores)?))
    }
}
