//! Single-label classifiers.

pub mod image_classifier;

pub use image_classifier::{ClassifierPreprocessConfig, ImageClassifier};
