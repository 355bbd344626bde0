use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::id::ResourceId;

/// Resource cache: maps identifiers to decoded resources.
///
/// Clones share the same map. Writers (`store`, `clear`) take the write lock,
/// so a lookup sees either the full set or the cleared one, never a partial
/// clear. There is no capacity limit; entries only leave through `clear`.
pub struct ResourceCache<R> {
    entries: Arc<RwLock<AHashMap<ResourceId, R>>>,
}

impl<R> Clone for ResourceCache<R> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<R> Default for ResourceCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> std::fmt::Debug for ResourceCache<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("len", &self.len())
            .finish()
    }
}

impl<R> ResourceCache<R> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(AHashMap::new())),
        }
    }

    /// Insert or overwrite the resource for `id`.
    pub fn store(&self, id: ResourceId, resource: R) {
        self.entries.write().insert(id, resource);
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        debug!("clearing {} cached resources", entries.len());
        entries.clear();
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.entries.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<R: Clone> ResourceCache<R> {
    pub fn lookup(&self, id: &ResourceId) -> Option<R> {
        self.entries.read().get(id).cloned()
    }
}
