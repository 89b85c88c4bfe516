//! Process-wide cache of loaded backends.
//!
//! The map lock is held only long enough to fetch a key's cell. Construction
//! runs under the cell's own once-lock, so concurrent requests for one model
//! share a single load while different models load in parallel. A failed load
//! leaves the cell empty and the next request retries. Each cell remembers
//! the descriptor it was built for; when a model id is re-registered with a
//! different name, format or weights the stale cell is replaced.

use super::loader::BackendLoader;
use crate::core::errors::PipelineError;
use crate::core::traits::Backend;
use crate::domain::{ModelDescriptor, ModelId, WeightsLocation};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

type BackendCell = Arc<OnceCell<Arc<dyn Backend>>>;

/// Cell of one model id plus the registration it was built for.
struct CacheEntry {
    name: String,
    format_tag: String,
    weights: Option<WeightsLocation>,
    cell: BackendCell,
}

impl CacheEntry {
    fn new(descriptor: &ModelDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            format_tag: descriptor.format_tag.clone(),
            weights: descriptor.weights.clone(),
            cell: BackendCell::default(),
        }
    }

    fn built_for(&self, descriptor: &ModelDescriptor) -> bool {
        self.name == descriptor.name
            && self.format_tag == descriptor.format_tag
            && self.weights == descriptor.weights
    }
}

/// Lazily populated backends keyed by model id.
#[derive(Default)]
pub struct BackendCache {
    cells: Mutex<HashMap<ModelId, CacheEntry>>,
}

impl std::fmt::Debug for BackendCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendCache")
            .field("loaded", &self.loaded_ids())
            .finish()
    }
}

impl BackendCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cells(&self) -> MutexGuard<'_, HashMap<ModelId, CacheEntry>> {
        self.cells.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the cell for `descriptor`, replacing one built for an older
    /// registration of the same id.
    fn cell_for(&self, descriptor: &ModelDescriptor) -> BackendCell {
        let mut cells = self.cells();
        if let Some(entry) = cells.get(&descriptor.id) {
            if entry.built_for(descriptor) {
                return Arc::clone(&entry.cell);
            }
            tracing::info!(
                model_id = %descriptor.id,
                "descriptor changed, dropping cached backend"
            );
        }
        let entry = CacheEntry::new(descriptor);
        let cell = Arc::clone(&entry.cell);
        cells.insert(descriptor.id.clone(), entry);
        cell
    }

    /// Returns the cached backend for `descriptor`, loading it on first use.
    pub fn get_or_load(
        &self,
        descriptor: &ModelDescriptor,
        loader: &dyn BackendLoader,
    ) -> Result<Arc<dyn Backend>, PipelineError> {
        let cell = self.cell_for(descriptor);

        let backend = cell.get_or_try_init(|| {
            let start = Instant::now();
            let backend = loader.load(descriptor)?;
            tracing::debug!(
                model_id = %descriptor.id,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "backend cached"
            );
            Ok::<_, PipelineError>(backend)
        })?;
        Ok(Arc::clone(backend))
    }

    /// Drops the cached backend for `id`. Returns whether one was loaded.
    pub fn evict(&self, id: &ModelId) -> bool {
        self.cells()
            .remove(id)
            .is_some_and(|entry| entry.cell.get().is_some())
    }

    /// Drops every cached backend.
    pub fn clear(&self) {
        self.cells().clear();
    }

    /// Ids whose backend is loaded.
    pub fn loaded_ids(&self) -> Vec<ModelId> {
        let mut ids: Vec<ModelId> = self
            .cells()
            .iter()
            .filter(|(_, entry)| entry.cell.get().is_some())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of loaded backends.
    pub fn len(&self) -> usize {
        self.loaded_ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
