//! Decoding uploaded images and encoding the canonical output.

use crate::core::errors::PipelineError;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};

/// Maps a declared format tag (`jpg`, `PNG`, `image/webp`, ...) to an image format.
pub fn format_from_tag(tag: &str) -> Option<ImageFormat> {
    let tag = tag.trim().to_ascii_lowercase();
    if tag.contains('/') {
        ImageFormat::from_mime_type(&tag)
    } else {
        ImageFormat::from_extension(tag.trim_start_matches('.'))
    }
}

/// Decodes raw bytes into an RGB image.
///
/// The declared format is tried first; if it is unknown or wrong, the format
/// is sniffed from the content.
///
/// # Errors
///
/// [`PipelineError::InvalidImage`] when the bytes are empty or no decoder
/// accepts them.
pub fn decode_image(bytes: &[u8], format_tag: &str) -> Result<RgbImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::invalid_image("image has no bytes", None));
    }

    if let Some(format) = format_from_tag(format_tag) {
        match image::load_from_memory_with_format(bytes, format) {
            Ok(img) => return Ok(img.to_rgb8()),
            Err(e) => tracing::debug!(
                declared = format_tag,
                error = %e,
                "declared format failed, sniffing content"
            ),
        }
    }

    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|e| {
            PipelineError::invalid_image(
                format!(
                    "failed to decode {} bytes declared as '{format_tag}'",
                    bytes.len()
                ),
                Some(e),
            )
        })
}

/// Encodes an image as baseline JPEG.
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, PipelineError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .encode_image(img)
        .map_err(|e| PipelineError::encoding("failed to encode JPEG", e))?;
    Ok(bytes)
}
