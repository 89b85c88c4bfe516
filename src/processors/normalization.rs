//! Image normalization into NCHW tensors.
//!
//! Pixel values are mapped as `v * alpha[c] + beta[c]` where
//! `alpha = scale / std` and `beta = -mean / std`, so `mean` is expressed in
//! the same units as the scaled pixel.

use crate::core::errors::PipelineError;
use crate::core::inference::Tensor4D;
use image::{RgbImage, imageops};

/// Channel layout the model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorOrder {
    /// Red, green, blue.
    Rgb,
    /// Blue, green, red (Caffe-style models).
    Bgr,
    /// Single luminance channel.
    Gray,
}

impl ColorOrder {
    /// Number of tensor channels.
    pub fn channels(&self) -> usize {
        match self {
            ColorOrder::Rgb | ColorOrder::Bgr => 3,
            ColorOrder::Gray => 1,
        }
    }
}

/// Normalizes images into single-image NCHW tensors.
#[derive(Debug, Clone)]
pub struct NormalizeImage {
    /// Scaling factors for each channel (alpha = scale / std)
    pub alpha: Vec<f32>,
    /// Offset values for each channel (beta = -mean / std)
    pub beta: Vec<f32>,
    /// Channel layout of the produced tensor.
    pub color: ColorOrder,
}

impl NormalizeImage {
    /// Creates a normalizer.
    ///
    /// `mean` and `std` are given in tensor channel order and must have one
    /// entry per channel of `color`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the scale or a standard deviation
    /// is not positive, or the per-channel vectors have the wrong length.
    pub fn new(
        scale: f32,
        mean: Vec<f32>,
        std: Vec<f32>,
        color: ColorOrder,
    ) -> Result<Self, PipelineError> {
        if scale <= 0.0 {
            return Err(PipelineError::config_error("Scale must be greater than 0"));
        }

        let channels = color.channels();
        if mean.len() != channels || std.len() != channels {
            return Err(PipelineError::config_error(format!(
                "Mean and std must have exactly {channels} elements for {color:?}, got {} and {}",
                mean.len(),
                std.len()
            )));
        }

        for (i, &s) in std.iter().enumerate() {
            if s <= 0.0 {
                return Err(PipelineError::config_error(format!(
                    "Standard deviation at index {i} must be greater than 0, got {s}"
                )));
            }
        }

        let alpha = std.iter().map(|s| scale / s).collect();
        let beta = mean.iter().zip(&std).map(|(m, s)| -m / s).collect();

        Ok(Self { alpha, beta, color })
    }

    /// Plain `[0, 1]` scaling, no mean subtraction.
    pub fn unit_scale(color: ColorOrder) -> Result<Self, PipelineError> {
        let channels = color.channels();
        Self::new(1.0 / 255.0, vec![0.0; channels], vec![1.0; channels], color)
    }

    /// Normalizes one image into a `[1, C, H, W]` tensor.
    pub fn normalize_to(&self, img: &RgbImage) -> Result<Tensor4D, PipelineError> {
        let (width, height) = img.dimensions();
        let (w, h) = (width as usize, height as usize);
        let channels = self.color.channels();
        let plane = w * h;
        let mut data = vec![0.0f32; channels * plane];

        match self.color {
            ColorOrder::Rgb | ColorOrder::Bgr => {
                let swap = self.color == ColorOrder::Bgr;
                for (x, y, pixel) in img.enumerate_pixels() {
                    let offset = y as usize * w + x as usize;
                    for c in 0..3 {
                        let src = if swap { 2 - c } else { c };
                        data[c * plane + offset] =
                            pixel[src] as f32 * self.alpha[c] + self.beta[c];
                    }
                }
            }
            ColorOrder::Gray => {
                let gray = imageops::grayscale(img);
                for (x, y, pixel) in gray.enumerate_pixels() {
                    let offset = y as usize * w + x as usize;
                    data[offset] = pixel[0] as f32 * self.alpha[0] + self.beta[0];
                }
            }
        }

        Ok(Tensor4D::from_shape_vec((1, channels, h, w), data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(NormalizeImage::new(0.0, vec![0.0; 3], vec![1.0; 3], ColorOrder::Rgb).is_err());
        assert!(NormalizeImage::new(1.0, vec![0.0; 3], vec![1.0; 3], ColorOrder::Gray).is_err());
        assert!(
            NormalizeImage::new(1.0, vec![0.0; 3], vec![1.0, 0.0, 1.0], ColorOrder::Rgb).is_err()
        );
    }

    #[test]
    fn test_bgr_swaps_channels_and_subtracts_mean() {
        let img = RgbImage::from_pixel(2, 1, Rgb([10, 20, 30]));
        let norm =
            NormalizeImage::new(1.0, vec![1.0, 2.0, 3.0], vec![1.0; 3], ColorOrder::Bgr).unwrap();
        let tensor = norm.normalize_to(&img).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 1, 2]);
        assert_eq!(tensor[[0, 0, 0, 0]], 29.0);
        assert_eq!(tensor[[0, 1, 0, 1]], 18.0);
        assert_eq!(tensor[[0, 2, 0, 0]], 7.0);
    }

    #[test]
    fn test_gray_unit_scale() {
        let img = RgbImage::from_pixel(3, 2, Rgb([255, 255, 255]));
        let tensor = NormalizeImage::unit_scale(ColorOrder::Gray)
            .unwrap()
            .normalize_to(&img)
            .unwrap();
        assert_eq!(tensor.shape(), &[1, 1, 2, 3]);
        assert!(tensor.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }
}
