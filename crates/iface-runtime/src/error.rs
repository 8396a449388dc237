//! Runtime error types.
//!
//! Uses `thiserror` for structured, matchable error variants. Declaration
//! and construction errors are fatal to the operation that raised them;
//! adaptation failures are recoverable and can be queried with
//! [`InterfaceError::is_adaptation_failure`].

use iface_core::error::CoreError;
use iface_core::id::ClassId;
use thiserror::Error;

/// Errors produced by the interface runtime.
#[derive(Debug, Clone, Error)]
pub enum InterfaceError {
    /// An interface member's body failed the emptiness verifier.
    #[error("function '{name}' is not empty; did you forget to add a concrete base class?")]
    FunctionNotEmpty { name: String },

    /// A declaration error from the member classifier.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A concrete override's signature is inconsistent with the interface's
    /// declared signature.
    #[error("{class}.{method} arguments do not match the interface signature")]
    SignatureMismatch { class: String, method: String },

    /// An interface method was overridden with a non-callable value.
    #[error("interface method '{name}' overridden with a non-method in {class}")]
    MethodOverriddenWithNonMethod { class: String, name: String },

    /// An attempt to instantiate a class still classified as an interface.
    #[error("interfaces cannot be instantiated: {name}")]
    InterfaceInstantiation { name: String },

    /// The initializer did not establish a contractually required attribute.
    #[error("{class} initializer does not create required attribute '{attribute}'")]
    MissingRequiredAttribute { class: String, attribute: String },

    /// An interface-only operation was invoked on a non-interface class.
    #[error("{name} is not an interface")]
    NotAnInterface { name: String },

    /// A class used for adapter inference declares no interfaces.
    #[error("class {class} does not provide any interfaces")]
    NoInterfacesProvided { class: String },

    /// A ClassId was not found in the registry.
    #[error("class not found: ClassId({id})")]
    UnknownClass { id: ClassId },

    /// Registering a class name that already exists.
    #[error("duplicate class name: '{name}'")]
    DuplicateClassName { name: String },

    /// No adapter was found for the object's type.
    #[error("cannot adapt {class} to {interface}")]
    CannotAdapt { class: String, interface: String },

    /// An adapter's output does not actually provide the target interface.
    #[error("adapter output does not implement interface {interface}")]
    AdapterOutputInvalid { interface: String },

    /// A live adapter is already registered for this (type, interface) pair.
    #[error("{class} already has an adapter to {interface}")]
    DuplicateAdapter { class: String, interface: String },

    /// Attribute access on an interface-only view outside the interface's
    /// declared member names.
    #[error("'{interface}' interface has no attribute '{name}'")]
    NoInterfaceAttribute { interface: String, name: String },

    /// Attribute access that found no stored value.
    #[error("{owner} has no attribute '{name}'")]
    NoSuchAttribute { owner: String, name: String },
}

impl InterfaceError {
    /// Returns `true` for the recoverable adaptation failures that
    /// `adapt_or_none`, `can_adapt` and `filter_adapt` suppress.
    pub fn is_adaptation_failure(&self) -> bool {
        matches!(
            self,
            InterfaceError::CannotAdapt { .. } | InterfaceError::AdapterOutputInvalid { .. }
        )
    }
}
