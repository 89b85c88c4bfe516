//! Image codecs and drawing helpers shared by the pipeline stages.

pub mod image;
pub mod visualization;

pub use self::image::{decode_image, encode_jpeg, format_from_tag};
pub use visualization::{load_font, measure_text_width};
