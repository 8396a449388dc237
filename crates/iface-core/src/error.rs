//! Core error types for iface-core.
//!
//! Uses `thiserror` for structured, matchable error variants.

use crate::value::ConstValue;
use thiserror::Error;

/// Errors produced by the pure classification utilities.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// An interface namespace entry carried a value other than the unset
    /// placeholder.
    #[error("interface class attributes must be unset or a placeholder: {name} = {value}")]
    InvalidMemberValue { name: String, value: ConstValue },
}
