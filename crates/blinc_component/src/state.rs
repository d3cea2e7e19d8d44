//! Shared state storage for stateful units
//!
//! A unit never writes its own state. The state lives in a [`StateCell`] that
//! the unit hands to its updater along with each request; the updater clones
//! the cell and commits into it whenever its batching window closes. Anything
//! the unit (or its caller) reads is a point-in-time snapshot.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::update::{merge_state, StateMap, StateUpdate};

/// Cloneable handle to a unit's state
#[derive(Clone, Default)]
pub struct StateCell {
    inner: Arc<RwLock<StateMap>>,
}

impl StateCell {
    /// Create a cell holding `initial`
    pub fn new(initial: StateMap) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> StateMap {
        self.inner.read().clone()
    }

    /// Read a single field
    pub fn get(&self, field: &str) -> Option<Value> {
        self.inner.read().get(field).cloned()
    }

    /// Run `f` against the current state without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&StateMap) -> R) -> R {
        f(&self.inner.read())
    }

    /// Decode the current state into a typed value
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let snapshot = Value::Object(self.snapshot());
        Ok(serde_json::from_value(snapshot)?)
    }

    /// Replace the whole state. For updater implementations.
    pub fn commit(&self, next: StateMap) {
        *self.inner.write() = next;
    }

    /// Resolve `update` against the latest state and shallow-merge the result.
    /// For updater implementations.
    ///
    /// Returns `true` if anything was merged. Functional updates see a snapshot
    /// and run without holding the lock.
    pub fn apply(&self, update: &StateUpdate, props: &Value, context: &Value) -> bool {
        let latest = self.snapshot();
        match update.resolve(&latest, props, context) {
            Some(partial) => {
                merge_state(&mut self.inner.write(), partial);
                true
            }
            None => false,
        }
    }

    /// Whether two handles point at the same state
    pub fn ptr_eq(&self, other: &StateCell) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for StateCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StateCell").field(&*self.inner.read()).finish()
    }
}
