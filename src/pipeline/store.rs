//! Persistence seam for processed artifacts.

use crate::core::errors::PipelineError;
use crate::domain::ProcessedArtifact;
use std::collections::HashMap;
use std::sync::RwLock;

/// Holds the current artifact of each image.
///
/// Saving for an image that already has an artifact replaces it.
pub trait ArtifactStore: Send + Sync {
    /// Stores `artifact`, returning the one it replaced.
    fn save(
        &self,
        artifact: ProcessedArtifact,
    ) -> Result<Option<ProcessedArtifact>, PipelineError>;

    /// The current artifact of `image_id`.
    fn current(&self, image_id: &str) -> Option<ProcessedArtifact>;

    /// Removes the artifact of a deleted image.
    fn remove_for_image(&self, image_id: &str) -> Option<ProcessedArtifact>;
}

/// [`ArtifactStore`] backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    artifacts: RwLock<HashMap<String, ProcessedArtifact>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.artifacts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn save(
        &self,
        artifact: ProcessedArtifact,
    ) -> Result<Option<ProcessedArtifact>, PipelineError> {
        let mut artifacts = self.artifacts.write().unwrap_or_else(|e| e.into_inner());
        let previous = artifacts.insert(artifact.image_id.clone(), artifact);
        if let Some(previous) = &previous {
            tracing::debug!(
                image_id = %previous.image_id,
                model_id = %previous.model_id,
                "replaced artifact"
            );
        }
        Ok(previous)
    }

    fn current(&self, image_id: &str) -> Option<ProcessedArtifact> {
        self.artifacts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(image_id)
            .cloned()
    }

    fn remove_for_image(&self, image_id: &str) -> Option<ProcessedArtifact> {
        self.artifacts
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(image_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelId, OutputFormat, StageTimings};
    use std::time::Duration;

    fn artifact(image_id: &str, model_id: &str, bytes: &[u8]) -> ProcessedArtifact {
        ProcessedArtifact {
            image_id: image_id.into(),
            model_id: ModelId::new(model_id),
            bytes: bytes.to_vec(),
            output_format: OutputFormat::Jpeg,
            duration: Duration::from_millis(5),
            timings: StageTimings::default(),
        }
    }

    #[test]
    fn test_save_replaces_per_image() {
        let store = InMemoryArtifactStore::new();
        assert!(store.save(artifact("img", "1", b"a")).unwrap().is_none());
        let replaced = store.save(artifact("img", "2", b"bb")).unwrap().unwrap();

        assert_eq!(replaced.model_id, ModelId::new("1"));
        assert_eq!(store.len(), 1);
        let current = store.current("img").unwrap();
        assert_eq!(current.model_id, ModelId::new("2"));
        assert_eq!(current.byte_size(), 2);
    }

    #[test]
    fn test_remove_for_image() {
        let store = InMemoryArtifactStore::new();
        store.save(artifact("a", "1", b"x")).unwrap();
        store.save(artifact("b", "1", b"y")).unwrap();

        assert!(store.remove_for_image("a").is_some());
        assert!(store.remove_for_image("a").is_none());
        assert!(store.current("a").is_none());
        assert!(store.current("b").is_some());
    }
}
