//! Domain types shared across the pipeline.
//!
//! Assets, descriptors and artifacts are the records the pipeline reads and
//! produces; [`RawResult`] is the structured output every inference strategy
//! returns before the annotator renders it.

pub mod artifact;
pub mod descriptor;
pub mod image_asset;
pub mod labels;
pub mod model_kind;
pub mod raw_result;
pub mod topology;

pub use artifact::{OutputFormat, ProcessedArtifact, StageTimings};
pub use descriptor::{ModelDescriptor, ModelFamily, ModelFormat, ModelId, WeightsLocation};
pub use image_asset::ImageAsset;
pub use model_kind::ModelKind;
pub use raw_result::{
    BoundingBox, Classification, Detection, Landmark, LandmarkSet, RawResult,
};
pub use topology::Topology;
