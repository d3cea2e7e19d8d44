//! Blinc Component Base
//!
//! This crate provides the contract every stateful Blinc component is built on:
//!
//! - **Stateful units**: immutable props and context, state, and named refs
//! - **Updater delegation**: units never apply their own state transitions;
//!   every `set_state`/`force_update` is validated and forwarded to an
//!   injected [`Updater`]
//! - **No-op updater**: an inert fallback that logs requests made on units
//!   without a mounted updater
//! - **Pure units**: a marker reconcilers read to skip re-rendering when props
//!   and state are shallowly equal
//!
//! Reconciliation, scheduling and rendering live elsewhere; this crate only
//! defines the shape of the capability it calls into.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use blinc_component::{
//!     MountStatus, StateUpdate, Stateful, StatefulUnit, UpdateCallback, UpdateSource, Updater,
//! };
//! use serde_json::json;
//!
//! /// Applies every request immediately
//! #[derive(Default)]
//! struct ImmediateUpdater {
//!     log: Mutex<Vec<UpdateSource>>,
//! }
//!
//! impl Updater for ImmediateUpdater {
//!     fn enqueue_state_update(
//!         &self,
//!         unit: &dyn Stateful,
//!         update: Option<StateUpdate>,
//!         callback: Option<UpdateCallback>,
//!         source: UpdateSource,
//!     ) {
//!         if let Some(update) = update {
//!             unit.state_cell().apply(&update, unit.props(), unit.context());
//!         }
//!         self.log.lock().unwrap().push(source);
//!         if let Some(callback) = callback {
//!             callback();
//!         }
//!     }
//!
//!     fn enqueue_force_update(
//!         &self,
//!         _unit: &dyn Stateful,
//!         _callback: Option<UpdateCallback>,
//!         source: UpdateSource,
//!     ) {
//!         self.log.lock().unwrap().push(source);
//!     }
//!
//!     fn is_mounted(&self, _unit: &dyn Stateful) -> MountStatus {
//!         MountStatus::Mounted
//!     }
//! }
//!
//! let updater = Arc::new(ImmediateUpdater::default());
//! let unit = StatefulUnit::with_updater(json!({ "name": "demo" }), json!({}), &updater);
//!
//! unit.set_state(json!({ "count": 1 })).unwrap();
//! unit.force_update();
//!
//! assert_eq!(unit.state().get("count"), Some(&json!(1)));
//! assert_eq!(
//!     *updater.log.lock().unwrap(),
//!     vec![UpdateSource::SetState, UpdateSource::ForceUpdate]
//! );
//! ```

pub mod compare;
#[cfg(debug_assertions)]
pub mod deprecated;
pub mod error;
pub mod refs;
pub mod state;
pub mod unit;
pub mod update;
pub mod updater;

pub use compare::{can_skip_update, shallow_equal, shallow_equal_maps};
#[cfg(debug_assertions)]
pub use deprecated::{DeprecatedApi, DeprecatedApiInfo, DEPRECATED_APIS};
pub use error::{Result, UnitError};
pub use refs::{RefHandle, RefMap};
pub use state::StateCell;
pub use unit::{PureStatefulUnit, Stateful, StatefulUnit, UnitCore, UnitId};
pub use update::{merge_state, ComputeFn, StateArg, StateMap, StateUpdate, UpdateCallback, UpdateSource};
pub use updater::{MountStatus, NoopUpdater, Updater, UpdaterSlot, UpdaterStatus};
