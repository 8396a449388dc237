//! Registry configuration and advisory diagnostics.
//!
//! Diagnostics are observational only: they never abort an operation. The
//! registry appends them to an in-process sink that tooling can read back,
//! and additionally emits them through `tracing` in development mode.
//!
//! [`Config`] is fixed at registry construction and never mutated mid-run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Development/production mode. Gates signature checking diagnostics,
/// advisory warnings and the interface-only wrapping default of `adapt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Development,
    Production,
}

/// Registry configuration, set once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub mode: Mode,
    /// When set, the emptiness verifier follows decorator back-reference
    /// chains before inspecting a body.
    pub unwrap_decorators: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: Mode::Development,
            unwrap_decorators: false,
        }
    }
}

impl Config {
    pub fn is_development(&self) -> bool {
        self.mode == Mode::Development
    }
}

/// A non-fatal advisory recorded by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A concrete class was built without implementing a required interface
    /// member and without the partial-implementation marker.
    IncompleteImplementation { class: String, member: String },

    /// A class was found to satisfy an interface structurally, without
    /// inheritance or registration. Emitted once per (interface, class).
    StructuralConformance { interface: String, class: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::IncompleteImplementation { class, member } => {
                write!(f, "Incomplete Implementation: {class} does not implement {member}")
            }
            Diagnostic::StructuralConformance { interface, class } => {
                write!(
                    f,
                    "Class {class} implements {interface}. \
                     Consider inheriting {interface} or registering an adapter for it"
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_development() {
        let config = Config::default();
        assert!(config.is_development());
        assert!(!config.unwrap_decorators);
    }

    #[test]
    fn incomplete_implementation_message() {
        let d = Diagnostic::IncompleteImplementation {
            class: "Cat".into(),
            member: "speak".into(),
        };
        assert_eq!(
            d.to_string(),
            "Incomplete Implementation: Cat does not implement speak"
        );
    }

    #[test]
    fn structural_conformance_message_names_both_sides() {
        let d = Diagnostic::StructuralConformance {
            interface: "IAnimal".into(),
            class: "Duck".into(),
        };
        let msg = d.to_string();
        assert!(msg.contains("Duck"));
        assert!(msg.contains("IAnimal"));
    }
}
