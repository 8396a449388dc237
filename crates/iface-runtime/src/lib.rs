pub mod adapt;
pub mod class;
pub mod conform;
pub mod diagnostics;
pub mod error;
pub mod instance;
pub mod registry;

// Re-export commonly used types
pub use adapt::{AdapterFn, AdapterHandle, FilterAdapt};
pub use class::{Class, InterfaceDescriptor};
pub use diagnostics::{Config, Diagnostic, Mode};
pub use error::InterfaceError;
pub use instance::{Instance, InterfaceView, Object};
pub use registry::ClassRegistry;
