//! The inference and annotation pipeline.
//!
//! A request flows through these components:
//!
//! 1. [`ModelDescriptorResolver`] turns a model id into a
//!    [`ModelDescriptor`](crate::domain::ModelDescriptor)
//! 2. [`BackendCache`] returns the loaded backend, building it once with a [`BackendLoader`]
//! 3. [`InferenceDispatcher`] runs the model's strategy under a timeout
//! 4. [`Annotator`] draws the result over the source image
//! 5. [`ProcessingOrchestrator`] encodes the output and packages the artifact
//!
//! Persisting artifacts is left to the caller through an [`ArtifactStore`].

pub mod annotator;
pub mod cache;
pub mod dispatcher;
pub mod loader;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod state;
pub mod stats;
pub mod store;

pub use annotator::Annotator;
pub use cache::BackendCache;
pub use dispatcher::InferenceDispatcher;
pub use loader::{BackendLoader, OnnxBackend, OrtBackendLoader};
pub use orchestrator::ProcessingOrchestrator;
pub use registry::StrategyRegistry;
pub use resolver::{ModelCatalog, ModelDescriptorResolver};
pub use state::PipelineState;
pub use stats::{ProcessingStats, StatsManager};
pub use store::{ArtifactStore, InMemoryArtifactStore};
