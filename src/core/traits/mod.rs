//! Trait seams of the pipeline.
//!
//! A [`Backend`] is a loaded, runnable model. An [`InferenceStrategy`] knows
//! how to turn an image into the backend's input and the backend's output
//! into a [`RawResult`](crate::domain::RawResult). Keeping the two apart lets
//! one strategy drive any backend of its format, and lets tests swap in fake
//! backends.

pub mod backend;
pub mod strategy;

pub use backend::{Backend, BackendInput};
pub use strategy::InferenceStrategy;
