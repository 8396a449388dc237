//! Constant attribute values.
//!
//! [`ConstValue`] is the value domain for class-level constants, instance
//! attributes and body literals. `Null` doubles as the "declared but unset"
//! placeholder: a class member declared with value `Null` is a plain data
//! attribute, not a constant.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A constant value stored on a class or an instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    /// The unset placeholder. Declaring a member with this value marks it
    /// as a plain data attribute.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ConstValue {
    /// Returns `true` if this is the unset placeholder.
    pub fn is_null(&self) -> bool {
        matches!(self, ConstValue::Null)
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Null => write!(f, "null"),
            ConstValue::Bool(b) => write!(f, "{b}"),
            ConstValue::Int(i) => write!(f, "{i}"),
            ConstValue::Float(x) => write!(f, "{x}"),
            ConstValue::Str(s) => write!(f, "{s:?}"),
        }
    }
}
