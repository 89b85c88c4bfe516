//! Drawing primitives used by the annotator.
//!
//! Fonts are optional: callers get `None` from [`load_font`] when neither the
//! configured path nor any well-known system font can be read, and decide
//! themselves whether text is required.

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{debug, info, warn};

const SYSTEM_FONT_PATHS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Reads and parses a font file.
pub fn read_font(path: &Path) -> Option<FontVec> {
    let data = std::fs::read(path).ok()?;
    FontVec::try_from_vec(data).ok()
}

/// Loads the caption font.
///
/// `path` is tried first. When it is unset or unreadable the common system
/// locations are searched.
pub fn load_font(path: Option<&Path>) -> Option<FontVec> {
    if let Some(path) = path {
        if let Some(font) = read_font(path) {
            info!("Loaded font: {}", path.display());
            return Some(font);
        }
        warn!(
            "Configured font '{}' could not be loaded, trying system fonts",
            path.display()
        );
    }

    for path in SYSTEM_FONT_PATHS {
        if let Ok(data) = std::fs::read(path)
            && let Ok(font) = FontVec::try_from_vec(data)
        {
            info!("Loaded system font: {}", path);
            return Some(font);
        }
    }

    debug!("No font found, captions will be skipped");
    None
}

/// Width in pixels of `text` rendered at `scale`.
pub fn measure_text_width(text: &str, font: &FontVec, scale: f32) -> f32 {
    let scaled = font.as_scaled(PxScale::from(scale));
    text.chars()
        .map(|c| scaled.h_advance(scaled.glyph_id(c)))
        .sum()
}

/// Draws a rectangle outline growing inward from its bounds.
///
/// Rings that no longer fit inside the rectangle are skipped, and imageproc
/// clips whatever falls outside the image.
pub fn draw_thick_rect(
    img: &mut RgbImage,
    (x1, y1, x2, y2): (i32, i32, i32, i32),
    thickness: u32,
    color: Rgb<u8>,
) {
    for i in 0..thickness as i32 {
        let width = x2 - x1 - 2 * i;
        let height = y2 - y1 - 2 * i;
        if width <= 0 || height <= 0 {
            break;
        }
        draw_hollow_rect_mut(
            img,
            Rect::at(x1 + i, y1 + i).of_size(width as u32, height as u32),
            color,
        );
    }
}

/// Draws `text` on a filled strip whose top-left corner is `(x, y)`.
///
/// Returns the strip size.
#[allow(clippy::too_many_arguments)]
pub fn draw_text_strip(
    img: &mut RgbImage,
    (x, y): (i32, i32),
    text: &str,
    font: &FontVec,
    scale: f32,
    padding: u32,
    background: Rgb<u8>,
    foreground: Rgb<u8>,
) -> (u32, u32) {
    let width = measure_text_width(text, font, scale).ceil() as u32 + 2 * padding;
    let height = scale.ceil() as u32 + 2 * padding;
    draw_filled_rect_mut(img, Rect::at(x, y).of_size(width, height), background);
    draw_text_mut(
        img,
        foreground,
        x + padding as i32,
        y + padding as i32,
        PxScale::from(scale),
        font,
        text,
    );
    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    #[test]
    fn test_thick_rect_grows_inward() {
        let mut img = RgbImage::new(40, 40);
        draw_thick_rect(&mut img, (10, 10, 30, 30), 3, RED);

        assert_eq!(*img.get_pixel(10, 20), RED);
        assert_eq!(*img.get_pixel(12, 20), RED);
        assert_eq!(*img.get_pixel(13, 20), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(9, 20), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(20, 20), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_thick_rect_clips_to_image() {
        let mut img = RgbImage::new(20, 20);
        draw_thick_rect(&mut img, (-5, -5, 50, 50), 2, RED);
        assert_eq!(*img.get_pixel(10, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_thin_rect_stops_early() {
        let mut img = RgbImage::new(10, 10);
        draw_thick_rect(&mut img, (2, 2, 4, 4), 5, RED);
        assert_eq!(*img.get_pixel(2, 2), RED);
    }

    #[test]
    fn test_missing_font_path_falls_through() {
        let missing = Path::new("/definitely/not/a/font.ttf");
        assert!(read_font(missing).is_none());
    }

    #[test]
    fn test_text_strip_fits_its_caption() {
        let font = crate::testing::fixture_font();
        let mut img = RgbImage::new(200, 60);
        let (width, height) = draw_text_strip(
            &mut img,
            (5, 5),
            "cat 0.92",
            &font,
            18.0,
            2,
            RED,
            Rgb([255, 255, 255]),
        );

        assert_eq!(height, 22);
        let text_width = measure_text_width("cat 0.92", &font, 18.0);
        assert!(text_width > 40.0 && text_width < 120.0, "{text_width}");
        assert_eq!(width, text_width.ceil() as u32 + 4);
        assert_eq!(*img.get_pixel(5, 5), RED);
        assert_eq!(*img.get_pixel(5 + width - 1, 5 + height - 1), RED);
        assert_eq!(*img.get_pixel(5 + width, 5), Rgb([0, 0, 0]));
        assert!((7..25).any(|y| (7..5 + width).any(|x| img.get_pixel(x, y)[1] > 200)));
    }
}
