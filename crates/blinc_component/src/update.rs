//! State update requests
//!
//! A [`StateUpdate`] is the unit of intent that travels from a stateful unit
//! to its updater. It is either a partial map of fields to merge, or a
//! function that computes such a map from the *latest* state, props and
//! context at the moment the updater applies it:
//!
//! ```rust
//! use blinc_component::{StateUpdate, StateMap};
//! use serde_json::{json, Value};
//!
//! // Merge `count: 1` into whatever the state is when the update lands
//! let partial = StateUpdate::from_value(json!({ "count": 1 }))
//!     .unwrap()
//!     .expect("objects are partial updates");
//!
//! // Increment relative to the latest state, not the one seen at request time
//! let increment = StateUpdate::compute(|state: &StateMap, _props: &Value, _ctx: &Value| {
//!     let count = state.get("count").and_then(Value::as_i64).unwrap_or(0);
//!     let mut next = StateMap::new();
//!     next.insert("count".into(), json!(count + 1));
//!     Some(next)
//! });
//!
//! assert!(!partial.is_functional());
//! assert!(increment.is_functional());
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Result, UnitError};

/// A mapping of state field names to values
pub type StateMap = serde_json::Map<String, Value>;

/// Function form of a state update: `(latest_state, props, context) -> partial`
///
/// Returning `None` means "nothing to merge".
pub type ComputeFn = dyn Fn(&StateMap, &Value, &Value) -> Option<StateMap> + Send + Sync;

/// Callback invoked by the updater once a requested update has been applied
pub type UpdateCallback = Box<dyn FnOnce() + Send>;

/// A validated state update request
#[derive(Clone)]
pub enum StateUpdate {
    /// Fields to shallow-merge into the current state
    Partial(StateMap),
    /// Computes the fields to merge from the latest state, props and context
    Compute(Arc<ComputeFn>),
}

impl StateUpdate {
    /// Create a partial update from a field map
    pub fn partial(fields: StateMap) -> Self {
        StateUpdate::Partial(fields)
    }

    /// Create a functional update
    pub fn compute<F>(f: F) -> Self
    where
        F: Fn(&StateMap, &Value, &Value) -> Option<StateMap> + Send + Sync + 'static,
    {
        StateUpdate::Compute(Arc::new(f))
    }

    /// Validate a dynamic value as a state update
    ///
    /// Objects become partial updates and `null` becomes "no update"; every
    /// other shape is rejected with [`UnitError::InvalidArgument`].
    pub fn from_value(value: Value) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Object(fields) => Ok(Some(StateUpdate::Partial(fields))),
            other => Err(UnitError::InvalidArgument(describe(&other))),
        }
    }

    /// Whether this update is computed from the latest state
    pub fn is_functional(&self) -> bool {
        matches!(self, StateUpdate::Compute(_))
    }

    /// Evaluate the update against the latest state, props and context
    pub fn resolve(&self, state: &StateMap, props: &Value, context: &Value) -> Option<StateMap> {
        match self {
            StateUpdate::Partial(fields) => Some(fields.clone()),
            StateUpdate::Compute(f) => f(state, props, context),
        }
    }
}

impl PartialEq for StateUpdate {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (StateUpdate::Partial(a), StateUpdate::Partial(b)) => a == b,
            (StateUpdate::Compute(a), StateUpdate::Compute(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for StateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateUpdate::Partial(fields) => f.debug_tuple("Partial").field(fields).finish(),
            StateUpdate::Compute(_) => f.write_str("Compute(<fn>)"),
        }
    }
}

/// Shallow-merge `partial` into `state`
///
/// Fields present in `partial` overwrite same-named fields; everything else
/// in `state` is preserved.
pub fn merge_state(state: &mut StateMap, partial: StateMap) {
    for (key, value) in partial {
        state.insert(key, value);
    }
}

/// Raw argument accepted by `set_state` before validation
///
/// Anything convertible into this can be handed to
/// [`Stateful::request_state_update`](crate::Stateful::request_state_update).
/// Validation into a [`StateUpdate`] happens inside the unit.
pub enum StateArg {
    /// A dynamic value; must be an object or `null`
    Value(Value),
    /// An already-typed update
    Update(StateUpdate),
    /// No update; the updater still receives the request
    Empty,
}

impl StateArg {
    /// Validate into the update forwarded to the updater
    pub fn into_update(self) -> Result<Option<StateUpdate>> {
        match self {
            StateArg::Value(value) => StateUpdate::from_value(value),
            StateArg::Update(update) => Ok(Some(update)),
            StateArg::Empty => Ok(None),
        }
    }
}

impl From<Value> for StateArg {
    fn from(value: Value) -> Self {
        StateArg::Value(value)
    }
}

impl From<StateMap> for StateArg {
    fn from(fields: StateMap) -> Self {
        StateArg::Update(StateUpdate::Partial(fields))
    }
}

impl From<StateUpdate> for StateArg {
    fn from(update: StateUpdate) -> Self {
        StateArg::Update(update)
    }
}

impl From<()> for StateArg {
    fn from(_: ()) -> Self {
        StateArg::Empty
    }
}

impl<T: Into<StateArg>> From<Option<T>> for StateArg {
    fn from(arg: Option<T>) -> Self {
        arg.map_or(StateArg::Empty, Into::into)
    }
}

/// Which unit operation produced a forwarded request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdateSource {
    /// `set_state`
    SetState,
    /// `force_update`
    ForceUpdate,
}

impl UpdateSource {
    /// The historical API name used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateSource::SetState => "setState",
            UpdateSource::ForceUpdate => "forceUpdate",
        }
    }
}

impl fmt::Display for UpdateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean `{b}`"),
        Value::Number(n) => format!("number `{n}`"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(items) => format!("array of {} items", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> StateMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_from_value_accepts_object_and_null() {
        let update = StateUpdate::from_value(json!({ "count": 1 })).unwrap();
        assert_eq!(update, Some(StateUpdate::Partial(fields(json!({ "count": 1 })))));

        assert_eq!(StateUpdate::from_value(Value::Null).unwrap(), None);
    }

    #[test]
    fn test_from_value_rejects_primitives() {
        for value in [json!(5), json!("five"), json!(true), json!([1, 2])] {
            let err = StateUpdate::from_value(value).unwrap_err();
            assert!(matches!(err, UnitError::InvalidArgument(_)));
        }
    }

    #[test]
    fn test_invalid_argument_message_names_the_shape() {
        let err = StateUpdate::from_value(json!(42)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("set_state(...)"));
        assert!(message.contains("number `42`"));
    }

    #[test]
    fn test_merge_is_shallow() {
        let mut state = fields(json!({ "a": 1, "nested": { "x": 1, "y": 2 } }));
        merge_state(&mut state, fields(json!({ "nested": { "x": 5 }, "b": 2 })));

        assert_eq!(
            Value::Object(state),
            json!({ "a": 1, "b": 2, "nested": { "x": 5 } })
        );
    }

    #[test]
    fn test_compute_sees_latest_inputs() {
        let update = StateUpdate::compute(|state, props, _ctx| {
            let step = props.get("step").and_then(Value::as_i64).unwrap_or(1);
            let count = state.get("count").and_then(Value::as_i64).unwrap_or(0);
            Some(fields(json!({ "count": count + step })))
        });

        let resolved = update
            .resolve(&fields(json!({ "count": 10 })), &json!({ "step": 3 }), &json!({}))
            .unwrap();
        assert_eq!(resolved.get("count"), Some(&json!(13)));
    }

    #[test]
    fn test_compute_equality_is_identity() {
        let a = StateUpdate::compute(|_, _, _| None);
        let b = StateUpdate::compute(|_, _, _| None);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_state_arg_conversions() {
        assert!(matches!(StateArg::from(()).into_update(), Ok(None)));
        assert!(matches!(StateArg::from(None::<Value>).into_update(), Ok(None)));
        assert!(matches!(
            StateArg::from(Some(json!({ "x": 1 }))).into_update(),
            Ok(Some(StateUpdate::Partial(_)))
        ));
        assert!(StateArg::from(json!(42)).into_update().is_err());
    }

    #[test]
    fn test_update_source_names() {
        assert_eq!(UpdateSource::SetState.as_str(), "setState");
        assert_eq!(UpdateSource::ForceUpdate.to_string(), "forceUpdate");
    }
}
