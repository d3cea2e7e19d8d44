//! The updater capability
//!
//! Units never apply their own state transitions. Each request is forwarded
//! to an [`Updater`] injected by the reconciler, which decides when and in
//! what batch the change lands. Until a real updater is attached (or after
//! it has been dropped) requests go to the [`NoopUpdater`], which only logs.

use std::sync::{Arc, Weak};

use crate::unit::Stateful;
use crate::update::{StateUpdate, UpdateCallback, UpdateSource};

/// Whether an updater considers a unit mounted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountStatus {
    Mounted,
    NotMounted,
    /// The updater cannot tell
    Unknown,
}

/// Scheduling capability that performs state merges and re-evaluation
///
/// Implementations receive requests in the exact order a unit issued them
/// and may defer, batch or merge them freely. `source` names the unit
/// operation that produced the request.
pub trait Updater: Send + Sync {
    /// Queue a state update. `update` is `None` for a null request.
    fn enqueue_state_update(
        &self,
        unit: &dyn Stateful,
        update: Option<StateUpdate>,
        callback: Option<UpdateCallback>,
        source: UpdateSource,
    );

    /// Queue a re-render that bypasses the should-update gate
    fn enqueue_force_update(
        &self,
        unit: &dyn Stateful,
        callback: Option<UpdateCallback>,
        source: UpdateSource,
    );

    /// Report whether `unit` is mounted in this updater's tree
    fn is_mounted(&self, unit: &dyn Stateful) -> MountStatus;
}

// =============================================================================
// NO-OP UPDATER
// =============================================================================

static NOOP_UPDATER: NoopUpdater = NoopUpdater;

/// Inert updater used when no real one is installed
///
/// Requests are dropped without touching state and callbacks are never
/// invoked. Debug builds (or the `diagnostics` feature) log a warning so an
/// update after teardown, or outside a managed tree, is visible.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopUpdater;

impl NoopUpdater {
    /// The process-wide instance
    pub fn shared() -> &'static NoopUpdater {
        &NOOP_UPDATER
    }

    fn warn_unmounted(unit: &dyn Stateful, source: UpdateSource) {
        #[cfg(any(debug_assertions, feature = "diagnostics"))]
        tracing::warn!(
            unit = %unit.display_name(),
            source = %source,
            "Can't call {}() on `{}` because it has no mounted updater. This is a no-op, \
             but it usually means the unit was updated after teardown or used outside a \
             managed tree.",
            source,
            unit.display_name(),
        );

        #[cfg(not(any(debug_assertions, feature = "diagnostics")))]
        let _ = (unit, source);
    }
}

impl Updater for NoopUpdater {
    fn enqueue_state_update(
        &self,
        unit: &dyn Stateful,
        _update: Option<StateUpdate>,
        _callback: Option<UpdateCallback>,
        source: UpdateSource,
    ) {
        Self::warn_unmounted(unit, source);
    }

    fn enqueue_force_update(
        &self,
        unit: &dyn Stateful,
        _callback: Option<UpdateCallback>,
        source: UpdateSource,
    ) {
        Self::warn_unmounted(unit, source);
    }

    fn is_mounted(&self, _unit: &dyn Stateful) -> MountStatus {
        MountStatus::NotMounted
    }
}

// =============================================================================
// UPDATER SLOT
// =============================================================================

/// What a unit's updater slot currently resolves to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdaterStatus {
    /// No updater was ever attached
    Noop,
    /// An attached updater is alive
    Live,
    /// The attached updater has been dropped
    Dropped,
}

/// Weak, replaceable reference from a unit to its updater
///
/// The slot never keeps an updater alive. Resolving an empty or dead slot
/// yields the [`NoopUpdater`].
#[derive(Clone, Default)]
pub enum UpdaterSlot {
    #[default]
    Noop,
    Attached(Weak<dyn Updater>),
}

impl UpdaterSlot {
    /// Reference `updater` without owning it
    pub fn attach<U: Updater + 'static>(updater: &Arc<U>) -> Self {
        let weak: Weak<U> = Arc::downgrade(updater);
        UpdaterSlot::Attached(weak)
    }

    /// Reference an already type-erased updater
    pub fn attach_dyn(updater: &Arc<dyn Updater>) -> Self {
        UpdaterSlot::Attached(Arc::downgrade(updater))
    }

    pub fn status(&self) -> UpdaterStatus {
        match self {
            UpdaterSlot::Noop => UpdaterStatus::Noop,
            UpdaterSlot::Attached(weak) if weak.strong_count() > 0 => UpdaterStatus::Live,
            UpdaterSlot::Attached(_) => UpdaterStatus::Dropped,
        }
    }

    /// Run `f` against the live updater, or the no-op one
    pub fn with<R>(&self, f: impl FnOnce(&dyn Updater) -> R) -> R {
        match self {
            UpdaterSlot::Attached(weak) => match weak.upgrade() {
                Some(updater) => f(updater.as_ref()),
                None => {
                    tracing::debug!("Attached updater was dropped, falling back to no-op");
                    f(NoopUpdater::shared())
                }
            },
            UpdaterSlot::Noop => f(NoopUpdater::shared()),
        }
    }
}

impl std::fmt::Debug for UpdaterSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("UpdaterSlot").field(&self.status()).finish()
    }
}
