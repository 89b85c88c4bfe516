//! Model descriptor lookup.

use crate::core::errors::PipelineError;
use crate::domain::{ModelDescriptor, ModelId};
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

/// Resolves model ids to their registered descriptors.
pub trait ModelDescriptorResolver: Send + Sync {
    /// Returns the descriptor registered under `id`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NotFound`] when nothing is registered under `id`.
    fn resolve(&self, id: &ModelId) -> Result<ModelDescriptor, PipelineError>;
}

/// In-memory model registry.
#[derive(Debug, Default)]
pub struct ModelCatalog {
    models: RwLock<HashMap<ModelId, ModelDescriptor>>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON array of descriptors.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let descriptors: Vec<ModelDescriptor> = serde_json::from_str(&contents).map_err(|e| {
            PipelineError::config_error(format!(
                "failed to parse model catalog {}: {e}",
                path.display()
            ))
        })?;

        let catalog = Self::new();
        for descriptor in descriptors {
            catalog.register(descriptor);
        }
        tracing::info!(path = %path.display(), models = catalog.len(), "loaded model catalog");
        Ok(catalog)
    }

    /// Inserts a descriptor, returning the one it replaced.
    pub fn register(&self, descriptor: ModelDescriptor) -> Option<ModelDescriptor> {
        self.write().insert(descriptor.id.clone(), descriptor)
    }

    /// Removes a descriptor.
    pub fn unregister(&self, id: &ModelId) -> Option<ModelDescriptor> {
        self.write().remove(id)
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<ModelId> {
        let mut ids: Vec<ModelId> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<ModelId, ModelDescriptor>> {
        self.models.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<ModelId, ModelDescriptor>> {
        self.models.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl ModelDescriptorResolver for ModelCatalog {
    fn resolve(&self, id: &ModelId) -> Result<ModelDescriptor, PipelineError> {
        self.read()
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_registered_and_missing() {
        let catalog = ModelCatalog::new();
        catalog.register(ModelDescriptor::new("1", "Hand Landmarks", "landmark", None));

        let found = catalog.resolve(&ModelId::new("1")).unwrap();
        assert_eq!(found.name, "Hand Landmarks");
        let err = catalog.resolve(&ModelId::new("2")).unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { ref model_id } if model_id == "2"));
    }

    #[test]
    fn test_register_replaces() {
        let catalog = ModelCatalog::new();
        catalog.register(ModelDescriptor::new("1", "Age Classification", "onnx", None));
        let previous =
            catalog.register(ModelDescriptor::new("1", "Gender Classification", "onnx", None));
        assert_eq!(previous.map(|d| d.name), Some("Age Classification".to_string()));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "1", "name": "YOLOv11x Object Detection", "format_tag": "yolo",
                  "weights": {{"path": "models/yolo"}}, "category": "Detection"}},
                {{"id": "2", "name": "Pose Landmarks", "format_tag": "mediapipe"}}
            ]"#
        )
        .unwrap();

        let catalog = ModelCatalog::from_json_file(file.path()).unwrap();
        assert_eq!(catalog.ids(), vec![ModelId::new("1"), ModelId::new("2")]);
        assert!(catalog.resolve(&ModelId::new("2")).unwrap().weights.is_none());
    }

    #[test]
    fn test_from_json_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            ModelCatalog::from_json_file(file.path()),
            Err(PipelineError::Config { .. })
        ));
    }
}
