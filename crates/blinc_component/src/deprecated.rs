//! Retired unit APIs
//!
//! `is_mounted` and `replace_state` used to exist on classic component
//! classes. They are kept as debug-only accessors that warn and do nothing,
//! so old call sites show up in logs during development. Release builds do
//! not compile this module, turning every remaining call into a build error.

use crate::unit::Stateful;
use crate::update::StateMap;

/// A retired API and the hint logged when it is touched
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeprecatedApiInfo {
    pub name: &'static str,
    pub hint: &'static str,
}

pub const IS_MOUNTED: DeprecatedApiInfo = DeprecatedApiInfo {
    name: "isMounted",
    hint: "Instead, make sure to clean up subscriptions and pending requests when the \
           unit is torn down to prevent memory leaks.",
};

pub const REPLACE_STATE: DeprecatedApiInfo = DeprecatedApiInfo {
    name: "replaceState",
    hint: "Refactor your code to use set_state instead.",
};

/// Every retired API, in declaration order
pub const DEPRECATED_APIS: [DeprecatedApiInfo; 2] = [IS_MOUNTED, REPLACE_STATE];

fn warn_deprecated(info: &DeprecatedApiInfo) {
    tracing::warn!(
        api = info.name,
        "{}(...) is deprecated in plain stateful units. {}",
        info.name,
        info.hint
    );
}

/// Warn-only accessors for retired APIs, available on every [`Stateful`]
pub trait DeprecatedApi: Stateful {
    /// Always `None`; logs a deprecation warning
    fn is_mounted(&self) -> Option<bool> {
        warn_deprecated(&IS_MOUNTED);
        None
    }

    /// Always `None` and leaves state untouched; logs a deprecation warning
    fn replace_state(&self, _next: StateMap) -> Option<()> {
        warn_deprecated(&REPLACE_STATE);
        None
    }
}

impl<T: Stateful + ?Sized> DeprecatedApi for T {}
