//! Landmark estimation: the strategy and the bundled pipeline backend it drives.

pub mod estimator;
pub mod pipeline;

pub use estimator::LandmarkEstimator;
pub use pipeline::LandmarkPipeline;
