//! Component error types

use thiserror::Error;

/// Errors raised by stateful units
#[derive(Error, Debug)]
pub enum UnitError {
    /// `set_state` was given something other than a mapping, a function or null
    #[error(
        "set_state(...): takes a map of state fields to update or a function which \
         returns a map of state fields, got {0}"
    )]
    InvalidArgument(String),

    /// Typed props or context could not be encoded
    #[error("Props encoding failed: {0}")]
    PropsEncode(serde_json::Error),

    /// A state snapshot could not be decoded into the requested type
    #[error("State decode failed: {0}")]
    StateDecode(#[from] serde_json::Error),
}

/// Result type for component operations
pub type Result<T> = std::result::Result<T, UnitError>;
