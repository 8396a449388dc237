pub mod body;
pub mod error;
pub mod id;
pub mod member;
pub mod signature;
pub mod value;

// Re-export commonly used types
pub use body::{is_empty_function, Body, BodyOp, Callable, NOT_IMPLEMENTED_SIGNAL};
pub use error::CoreError;
pub use id::ClassId;
pub use member::{
    classify_interface_namespace, ClassDef, ClassMember, ClassifiedNamespace, MemberDecl,
    MethodKind, PropertyDef,
};
pub use signature::{signatures_consistent, Signature};
pub use value::ConstValue;
