//! Inference strategies, one per model family.
//!
//! Each strategy implements [`InferenceStrategy`](crate::core::traits::InferenceStrategy):
//! it owns the pre- and post-processing of its models and drives whatever
//! backend the loader built for them.

pub mod classification;
pub mod detection;
pub mod landmark;

pub use crate::domain::ModelKind;
pub use classification::*;
pub use detection::*;
pub use landmark::*;
