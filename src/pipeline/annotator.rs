//! Overlay rendering for inference results.

use crate::core::config::AnnotationConfig;
use crate::core::constants::MIN_CAPTION_BAND_HEIGHT;
use crate::core::errors::PipelineError;
use crate::domain::{
    Classification, Detection, Landmark, LandmarkSet, ModelDescriptor, RawResult,
};
use crate::utils::visualization::{
    draw_text_strip, draw_thick_rect, load_font, measure_text_width,
};
use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage, imageops};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_text_mut};

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const BOX_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const BAND_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const BAND_TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const CONNECTION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const POINT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CAPTION_PADDING: u32 = 2;
/// Landmarks are clamped to this normalized range before drawing.
const LANDMARK_RANGE: (f32, f32) = (-1.0, 2.0);

/// Height of the caption band added below a classified image.
pub fn caption_band_height(image_height: u32) -> u32 {
    MIN_CAPTION_BAND_HEIGHT.max(image_height / 6)
}

/// Radius of landmark points for an image of the given size.
pub fn landmark_radius(width: u32, height: u32) -> i32 {
    (width.min(height) / 150).max(2) as i32
}

/// Renders [`RawResult`]s onto their source image.
pub struct Annotator {
    config: AnnotationConfig,
    font: Option<FontVec>,
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("config", &self.config)
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl Annotator {
    /// Creates an annotator, loading the font named by the config.
    pub fn new(config: AnnotationConfig) -> Self {
        let font = load_font(config.font_path.as_deref());
        Self::with_font(config, font)
    }

    /// Creates an annotator with an already loaded font.
    pub fn with_font(config: AnnotationConfig, font: Option<FontVec>) -> Self {
        Self { config, font }
    }

    pub fn config(&self) -> &AnnotationConfig {
        &self.config
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Returns a new image with `result` drawn over `image`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Encoding`] when a classification caption has to be
    /// rendered and no font is available.
    pub fn annotate(
        &self,
        image: &RgbImage,
        result: &RawResult,
        descriptor: &ModelDescriptor,
    ) -> Result<RgbImage, PipelineError> {
        match result {
            RawResult::Empty => Ok(image.clone()),
            RawResult::Detections(detections) => Ok(self.draw_detections(image, detections)),
            RawResult::Classification(classification) => {
                self.draw_classification(image, classification, descriptor)
            }
            RawResult::Landmarks(sets) => Ok(draw_landmarks(image, sets)),
        }
    }

    fn draw_detections(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.clone();
        let (width, height) = canvas.dimensions();

        for detection in detections {
            let bbox = detection.bbox.clip(width as f32, height as f32);
            let corners = (
                bbox.x1.floor() as i32,
                bbox.y1.floor() as i32,
                bbox.x2.ceil() as i32,
                bbox.y2.ceil() as i32,
            );
            draw_thick_rect(&mut canvas, corners, self.config.box_thickness, BOX_COLOR);

            if let Some(font) = &self.font {
                let caption = format!("{} {:.2}", detection.label, detection.score);
                let strip_height =
                    self.config.label_font_size.ceil() as i32 + 2 * CAPTION_PADDING as i32;
                let y = if corners.1 >= strip_height {
                    corners.1 - strip_height
                } else {
                    corners.1
                };
                draw_text_strip(
                    &mut canvas,
                    (corners.0, y),
                    &caption,
                    font,
                    self.config.label_font_size,
                    CAPTION_PADDING,
                    BOX_COLOR,
                    BOX_TEXT_COLOR,
                );
            }
        }
        canvas
    }

    fn draw_classification(
        &self,
        image: &RgbImage,
        classification: &Classification,
        descriptor: &ModelDescriptor,
    ) -> Result<RgbImage, PipelineError> {
        let font = self.font.as_ref().ok_or_else(|| {
            PipelineError::encoding_msg(format!(
                "no font available to caption '{}' output",
                descriptor.name
            ))
        })?;

        let (width, height) = image.dimensions();
        let band = caption_band_height(height);
        let mut canvas = RgbImage::from_pixel(width, height + band, BAND_COLOR);
        imageops::replace(&mut canvas, image, 0, 0);

        let text = classification.label.as_str();
        let mut scale = band as f32 * 0.5;
        let text_width = measure_text_width(text, font, scale);
        let max_width = width as f32 * 0.9;
        if text_width > max_width && text_width > 0.0 {
            scale *= max_width / text_width;
        }
        let text_width = measure_text_width(text, font, scale);
        let x = ((width as f32 - text_width) / 2.0).max(0.0) as i32;
        let y = height as i32 + ((band as f32 - scale) / 2.0).max(0.0) as i32;
        draw_text_mut(
            &mut canvas,
            BAND_TEXT_COLOR,
            x,
            y,
            PxScale::from(scale),
            font,
            text,
        );
        Ok(canvas)
    }
}

fn draw_landmarks(image: &RgbImage, sets: &[LandmarkSet]) -> RgbImage {
    let mut canvas = image.clone();
    let (width, height) = canvas.dimensions();
    let radius = landmark_radius(width, height);
    let line_width = (radius / 2).max(1);
    let (lo, hi) = LANDMARK_RANGE;
    let to_pixel = |point: &Landmark| {
        (point.x.is_finite() && point.y.is_finite()).then(|| {
            (
                point.x.clamp(lo, hi) * width as f32,
                point.y.clamp(lo, hi) * height as f32,
            )
        })
    };

    for set in sets {
        for &(a, b) in set.topology.connections {
            let (Some((ax, ay)), Some((bx, by))) = (
                set.points.get(a).and_then(to_pixel),
                set.points.get(b).and_then(to_pixel),
            ) else {
                continue;
            };
            for offset in 0..line_width {
                let d = offset as f32;
                draw_line_segment_mut(&mut canvas, (ax + d, ay), (bx + d, by), CONNECTION_COLOR);
                draw_line_segment_mut(&mut canvas, (ax, ay + d), (bx, by + d), CONNECTION_COLOR);
            }
        }
        for (x, y) in set.points.iter().filter_map(to_pixel) {
            draw_filled_circle_mut(&mut canvas, (x as i32, y as i32), radius, POINT_COLOR);
        }
    }
    canvas
}
