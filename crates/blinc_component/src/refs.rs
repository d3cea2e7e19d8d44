//! Named reference slots
//!
//! Every unit starts out pointing at one process-wide empty [`RefMap`]. The
//! shared map is never written; the first `attach` on a unit copies it into a
//! map owned by that unit, so units that never record a ref never allocate.

use std::any::Any;
use std::sync::{Arc, LazyLock};

use rustc_hash::FxHashMap;

/// Type-erased handle created by the reconciler or renderer
pub type RefHandle = Arc<dyn Any + Send + Sync>;

/// The shared empty map aliased by every unit without refs
static EMPTY_REFS: LazyLock<RefMap> = LazyLock::new(|| RefMap {
    entries: Arc::new(FxHashMap::default()),
});

/// Mapping from ref name to handle
#[derive(Clone)]
pub struct RefMap {
    entries: Arc<FxHashMap<String, RefHandle>>,
}

impl RefMap {
    /// The shared empty map
    pub fn empty() -> Self {
        EMPTY_REFS.clone()
    }

    /// Whether this map is still the shared empty instance
    pub fn is_shared_empty(&self) -> bool {
        Arc::ptr_eq(&self.entries, &EMPTY_REFS.entries)
    }

    /// Whether both maps are the same instance
    pub fn ptr_eq(&self, other: &RefMap) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    pub fn get(&self, name: &str) -> Option<&RefHandle> {
        self.entries.get(name)
    }

    /// Get a handle downcast to its concrete type
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.entries
            .get(name)
            .and_then(|handle| handle.clone().downcast::<T>().ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of all attached refs
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Record a handle under `name`, replacing any previous one
    ///
    /// Copies the map first if it is shared with anyone else, which always
    /// holds for the shared empty map.
    pub fn attach(&mut self, name: impl Into<String>, handle: RefHandle) -> Option<RefHandle> {
        let name = name.into();

        #[cfg(debug_assertions)]
        {
            if self.is_shared_empty() {
                tracing::trace!("Materializing ref map for first ref `{}`", name);
            }
        }

        Arc::make_mut(&mut self.entries).insert(name, handle)
    }

    /// Remove the handle recorded under `name`
    pub fn detach(&mut self, name: &str) -> Option<RefHandle> {
        if !self.entries.contains_key(name) {
            return None;
        }
        Arc::make_mut(&mut self.entries).remove(name)
    }
}

impl Default for RefMap {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for RefMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}
