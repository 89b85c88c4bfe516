//! Aspect-preserving resize onto a padded square canvas.

use crate::domain::BoundingBox;
use image::{Rgb, RgbImage, imageops};

/// How a source image was placed on the letterboxed canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxInfo {
    /// Resize ratio applied to the source.
    pub scale: f32,
    /// Horizontal ratio after rounding to whole pixels.
    pub scale_x: f32,
    /// Vertical ratio after rounding to whole pixels.
    pub scale_y: f32,
    /// Horizontal padding on the left, in canvas pixels.
    pub pad_x: f32,
    /// Vertical padding on the top, in canvas pixels.
    pub pad_y: f32,
    /// Source width.
    pub src_width: u32,
    /// Source height.
    pub src_height: u32,
}

impl LetterboxInfo {
    /// Maps a box from canvas coordinates back to source pixels, clipped to
    /// the source bounds.
    pub fn unmap(&self, bbox: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            (bbox.x1 - self.pad_x) / self.scale_x,
            (bbox.y1 - self.pad_y) / self.scale_y,
            (bbox.x2 - self.pad_x) / self.scale_x,
            (bbox.y2 - self.pad_y) / self.scale_y,
        )
        .clip(self.src_width as f32, self.src_height as f32)
    }
}

/// Resizes images to fit a `size x size` canvas, centering them and filling
/// the remainder with a constant gray.
#[derive(Debug, Clone, Copy)]
pub struct Letterbox {
    size: u32,
    fill: u8,
}

impl Letterbox {
    pub fn new(size: u32, fill: u8) -> Self {
        Self { size, fill }
    }

    /// Canvas side length.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn apply(&self, img: &RgbImage) -> (RgbImage, LetterboxInfo) {
        let (src_w, src_h) = img.dimensions();
        let scale = (self.size as f32 / src_w.max(1) as f32)
            .min(self.size as f32 / src_h.max(1) as f32);
        let new_w = ((src_w as f32 * scale).round() as u32).clamp(1, self.size);
        let new_h = ((src_h as f32 * scale).round() as u32).clamp(1, self.size);
        let pad_x = (self.size - new_w) / 2;
        let pad_y = (self.size - new_h) / 2;

        let mut canvas = RgbImage::from_pixel(self.size, self.size, Rgb([self.fill; 3]));
        if (new_w, new_h) == (src_w, src_h) {
            imageops::replace(&mut canvas, img, pad_x as i64, pad_y as i64);
        } else {
            let resized = imageops::resize(img, new_w, new_h, imageops::FilterType::Triangle);
            imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);
        }

        let info = LetterboxInfo {
            scale,
            scale_x: new_w as f32 / src_w.max(1) as f32,
            scale_y: new_h as f32 / src_h.max(1) as f32,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
            src_width: src_w,
            src_height: src_h,
        };
        (canvas, info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landscape_image_is_padded_vertically() {
        let img = RgbImage::from_pixel(640, 480, Rgb([0, 0, 0]));
        let (canvas, info) = Letterbox::new(640, 114).apply(&img);
        assert_eq!(canvas.dimensions(), (640, 640));
        assert_eq!(info.scale, 1.0);
        assert_eq!((info.pad_x, info.pad_y), (0.0, 80.0));
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([114, 114, 114]));
        assert_eq!(canvas.get_pixel(0, 80), &Rgb([0, 0, 0]));
        assert_eq!(canvas.get_pixel(0, 560), &Rgb([114, 114, 114]));
    }

    #[test]
    fn test_unmap_reverses_scale_and_padding() {
        let img = RgbImage::new(1280, 960);
        let (_, info) = Letterbox::new(640, 114).apply(&img);
        assert_eq!(info.scale, 0.5);
        let bbox = info.unmap(&BoundingBox::new(10.0, 90.0, 60.0, 140.0));
        assert_eq!(bbox, BoundingBox::new(20.0, 20.0, 120.0, 120.0));

        let clipped = info.unmap(&BoundingBox::new(-10.0, 70.0, 700.0, 600.0));
        assert_eq!(clipped, BoundingBox::new(0.0, 0.0, 1280.0, 960.0));
    }

    #[test]
    fn test_unmap_uses_the_rounded_size() {
        let img = RgbImage::new(333, 217);
        let (_, info) = Letterbox::new(640, 114).apply(&img);
        assert_eq!(info.pad_y, 111.0);
        assert_eq!(info.scale_y, 417.0 / 217.0);

        let bbox = info.unmap(&BoundingBox::new(0.0, 111.0, 640.0, 528.0));
        let expected = [0.0, 0.0, 333.0, 217.0];
        for (got, want) in [bbox.x1, bbox.y1, bbox.x2, bbox.y2].into_iter().zip(expected) {
            assert!((got - want).abs() < 1e-3, "{bbox:?}");
        }
    }
}
