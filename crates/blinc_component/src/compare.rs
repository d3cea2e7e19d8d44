//! Shallow comparison for reconcilers honoring the pure-unit marker

use serde_json::Value;

use crate::unit::Stateful;
use crate::update::StateMap;

/// Key-by-key comparison of two maps
///
/// Both must hold the same keys with equal values. Values themselves are
/// compared with `==`; there is no reference identity for JSON values.
pub fn shallow_equal_maps(a: &StateMap, b: &StateMap) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| other == value))
}

/// Shallow comparison of two props/state values
///
/// Objects compare key by key; any other pair compares with `==`.
pub fn shallow_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => shallow_equal_maps(a, b),
        _ => a == b,
    }
}

/// Whether a reconciler may skip re-rendering `unit` for the given inputs
///
/// Only units reporting [`Stateful::is_shallow_comparable`] qualify.
pub fn can_skip_update(unit: &dyn Stateful, next_props: &Value, next_state: &StateMap) -> bool {
    unit.is_shallow_comparable()
        && shallow_equal(unit.props(), next_props)
        && unit
            .state_cell()
            .read(|state| shallow_equal_maps(state, next_state))
}
