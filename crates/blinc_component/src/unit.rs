//! Stateful units
//!
//! A stateful unit holds immutable props and context, a state it never writes
//! itself, a set of named refs, and a weak reference to the updater that
//! actually applies state transitions.
//!
//! All behavior lives in the [`Stateful`] trait's provided methods, written
//! once over [`UnitCore`]. [`StatefulUnit`] and [`PureStatefulUnit`] are thin
//! carriers of a core; the pure variant only differs in reporting
//! [`Stateful::is_shallow_comparable`], which reconcilers read to skip
//! re-rendering when props and state are shallowly equal.
//!
//! ```rust
//! use blinc_component::{Stateful, StatefulUnit, UpdaterStatus};
//! use serde_json::json;
//!
//! let unit = StatefulUnit::new(json!({ "name": "demo" }), json!({}));
//! assert_eq!(unit.updater_status(), UpdaterStatus::Noop);
//!
//! // Accepted, logged, and dropped by the no-op updater
//! unit.set_state(json!({ "count": 1 })).unwrap();
//! assert!(unit.state().is_empty());
//!
//! // Rejected before anything is forwarded
//! assert!(unit.set_state(json!(42)).is_err());
//! ```

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, UnitError};
use crate::refs::{RefHandle, RefMap};
use crate::state::StateCell;
use crate::update::{StateArg, StateMap, UpdateCallback, UpdateSource};
use crate::updater::{Updater, UpdaterSlot, UpdaterStatus};

static NEXT_UNIT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a unit, for updaters to key their queues
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u64);

impl UnitId {
    fn next() -> Self {
        UnitId(NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn to_raw(self) -> u64 {
        self.0
    }
}

/// Data shared by every stateful unit
pub struct UnitCore {
    id: UnitId,
    name: Cow<'static, str>,
    props: Value,
    context: Value,
    state: StateCell,
    refs: RefMap,
    updater: UpdaterSlot,
}

impl UnitCore {
    /// Create a core with the no-op updater and the shared empty refs
    pub fn new(props: Value, context: Value, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: UnitId::next(),
            name: name.into(),
            props,
            context,
            state: StateCell::default(),
            refs: RefMap::empty(),
            updater: UpdaterSlot::Noop,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn props(&self) -> &Value {
        &self.props
    }

    pub fn context(&self) -> &Value {
        &self.context
    }

    pub fn state(&self) -> &StateCell {
        &self.state
    }

    pub fn refs(&self) -> &RefMap {
        &self.refs
    }

    pub fn refs_mut(&mut self) -> &mut RefMap {
        &mut self.refs
    }

    pub fn updater(&self) -> &UpdaterSlot {
        &self.updater
    }

    pub fn set_updater(&mut self, slot: UpdaterSlot) {
        self.updater = slot;
    }

    pub fn set_name(&mut self, name: impl Into<Cow<'static, str>>) {
        self.name = name.into();
    }

    /// Install the initial state. Meant for construction time only; later
    /// changes go through the updater.
    pub fn init_state(&mut self, initial: StateMap) {
        self.state.commit(initial);
    }

    pub fn set_refs(&mut self, refs: RefMap) {
        self.refs = refs;
    }
}

impl std::fmt::Debug for UnitCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitCore")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("props", &self.props)
            .field("context", &self.context)
            .field("state", &self.state)
            .field("refs", &self.refs)
            .field("updater", &self.updater)
            .finish()
    }
}

/// Operations shared by all stateful units
///
/// Implementors only provide access to their [`UnitCore`]. Every request is
/// validated, then forwarded to whatever updater the core currently
/// resolves to; nothing is applied in place.
pub trait Stateful: Send + Sync {
    fn core(&self) -> &UnitCore;

    fn core_mut(&mut self) -> &mut UnitCore;

    /// Marker read by reconcilers: skip re-rendering on shallow-equal input
    fn is_shallow_comparable(&self) -> bool {
        false
    }

    fn id(&self) -> UnitId {
        self.core().id()
    }

    /// Name used in diagnostics
    fn display_name(&self) -> &str {
        self.core().name()
    }

    fn props(&self) -> &Value {
        self.core().props()
    }

    fn context(&self) -> &Value {
        self.core().context()
    }

    /// Point-in-time copy of the state
    ///
    /// Requests issued before this call are not guaranteed to be visible yet.
    fn state(&self) -> StateMap {
        self.core().state().snapshot()
    }

    /// Decode a snapshot of the state into a typed value
    fn state_as<T: DeserializeOwned>(&self) -> Result<T>
    where
        Self: Sized,
    {
        self.state_cell().decode()
    }

    /// Handle updaters use to commit state
    ///
    /// Only the installed [`Updater`] should call `commit` or `apply` on it;
    /// everything else reads through [`state`](Stateful::state).
    fn state_cell(&self) -> &StateCell {
        self.core().state()
    }

    fn refs(&self) -> &RefMap {
        self.core().refs()
    }

    fn updater_status(&self) -> UpdaterStatus {
        self.core().updater().status()
    }

    /// Ask the updater to merge `update` into the state
    ///
    /// `update` must be a field map, a [`StateUpdate`](crate::StateUpdate)
    /// function, or null/absent. Anything else fails with
    /// [`UnitError::InvalidArgument`] and nothing is forwarded. There is no
    /// guarantee the state has changed when this returns; `callback` runs
    /// once the updater has applied the change.
    fn request_state_update(
        &self,
        update: impl Into<StateArg>,
        callback: Option<UpdateCallback>,
    ) -> Result<()>
    where
        Self: Sized,
    {
        let update = update.into().into_update()?;

        tracing::trace!(
            unit = %self.display_name(),
            functional = update.as_ref().is_some_and(|u| u.is_functional()),
            "Forwarding setState"
        );

        self.core().updater().with(|updater| {
            updater.enqueue_state_update(self, update, callback, UpdateSource::SetState)
        });
        Ok(())
    }

    /// [`request_state_update`](Stateful::request_state_update) without a callback
    fn set_state(&self, update: impl Into<StateArg>) -> Result<()>
    where
        Self: Sized,
    {
        self.request_state_update(update, None)
    }

    /// Ask the updater to re-render without consulting the should-update gate
    fn request_force_update(&self, callback: Option<UpdateCallback>)
    where
        Self: Sized,
    {
        tracing::trace!(unit = %self.display_name(), "Forwarding forceUpdate");

        self.core().updater().with(|updater| {
            updater.enqueue_force_update(self, callback, UpdateSource::ForceUpdate)
        });
    }

    /// [`request_force_update`](Stateful::request_force_update) without a callback
    fn force_update(&self)
    where
        Self: Sized,
    {
        self.request_force_update(None);
    }

    /// Point the unit at `updater` without owning it
    fn set_updater<U: Updater + 'static>(&mut self, updater: &Arc<U>)
    where
        Self: Sized,
    {
        self.core_mut().set_updater(UpdaterSlot::attach(updater));
    }

    /// Revert to the no-op updater
    fn clear_updater(&mut self) {
        self.core_mut().set_updater(UpdaterSlot::Noop);
    }

    /// Record a named ref, materializing this unit's own ref map if needed
    fn attach_ref(&mut self, name: impl Into<String>, handle: RefHandle) -> Option<RefHandle>
    where
        Self: Sized,
    {
        self.core_mut().refs_mut().attach(name, handle)
    }

    fn detach_ref(&mut self, name: &str) -> Option<RefHandle> {
        self.core_mut().refs_mut().detach(name)
    }

    // Builders

    fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self
    where
        Self: Sized,
    {
        self.core_mut().set_name(name);
        self
    }

    fn with_state(mut self, initial: StateMap) -> Self
    where
        Self: Sized,
    {
        self.core_mut().init_state(initial);
        self
    }

    /// Start from an existing ref map instead of the shared empty one
    fn with_refs(mut self, refs: RefMap) -> Self
    where
        Self: Sized,
    {
        self.core_mut().set_refs(refs);
        self
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(UnitError::PropsEncode)
}

// =============================================================================
// STATEFUL UNIT
// =============================================================================

/// Base stateful unit
#[derive(Debug)]
pub struct StatefulUnit {
    core: UnitCore,
}

impl StatefulUnit {
    pub const DEFAULT_NAME: &'static str = "StatefulUnit";

    /// Create a unit that forwards to the no-op updater until one is set
    pub fn new(props: Value, context: Value) -> Self {
        Self {
            core: UnitCore::new(props, context, Self::DEFAULT_NAME),
        }
    }

    /// Create a unit attached to `updater`
    pub fn with_updater<U: Updater + 'static>(props: Value, context: Value, updater: &Arc<U>) -> Self {
        let mut unit = Self::new(props, context);
        unit.set_updater(updater);
        unit
    }

    /// Create a unit from typed props and context
    pub fn from_props<P, C>(props: &P, context: &C) -> Result<Self>
    where
        P: Serialize + ?Sized,
        C: Serialize + ?Sized,
    {
        Ok(Self::new(encode(props)?, encode(context)?))
    }
}

impl Stateful for StatefulUnit {
    fn core(&self) -> &UnitCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut UnitCore {
        &mut self.core
    }
}

// =============================================================================
// PURE STATEFUL UNIT
// =============================================================================

/// Stateful unit whose reconciler may skip re-rendering on shallow-equal input
#[derive(Debug)]
pub struct PureStatefulUnit {
    core: UnitCore,
}

impl PureStatefulUnit {
    pub const DEFAULT_NAME: &'static str = "PureStatefulUnit";
    pub const IS_SHALLOW_COMPARABLE: bool = true;

    pub fn new(props: Value, context: Value) -> Self {
        Self {
            core: UnitCore::new(props, context, Self::DEFAULT_NAME),
        }
    }

    pub fn with_updater<U: Updater + 'static>(props: Value, context: Value, updater: &Arc<U>) -> Self {
        let mut unit = Self::new(props, context);
        unit.set_updater(updater);
        unit
    }

    pub fn from_props<P, C>(props: &P, context: &C) -> Result<Self>
    where
        P: Serialize + ?Sized,
        C: Serialize + ?Sized,
    {
        Ok(Self::new(encode(props)?, encode(context)?))
    }
}

impl Stateful for PureStatefulUnit {
    fn core(&self) -> &UnitCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut UnitCore {
        &mut self.core
    }

    fn is_shallow_comparable(&self) -> bool {
        Self::IS_SHALLOW_COMPARABLE
    }
}
