//! Image pre- and post-processing shared by the inference strategies.
//!
//! * `letterbox` - aspect-preserving resize onto a padded square canvas
//! * `normalization` - pixel normalization into NCHW tensors
//! * `nms` - class-aware non-maximum suppression
//! * `topk` - softmax and top-k selection for classifiers

pub mod letterbox;
pub mod nms;
mod normalization;
pub mod topk;

pub use letterbox::{Letterbox, LetterboxInfo};
pub use nms::class_aware_nms;
pub use normalization::*;
pub use topk::{argmax, softmax, top_k};
