//! Member declarations and the member classifier.
//!
//! A class is declared as a [`ClassDef`]: a name, base classes, and an
//! insertion-ordered namespace of [`MemberDecl`]s. For interface classes the
//! classifier partitions that namespace into plain data attributes,
//! properties and methods, wraps every retained member as abstract, and
//! collects the callables whose bodies must pass the emptiness verifier.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::body::Callable;
use crate::error::CoreError;
use crate::id::ClassId;
use crate::signature::Signature;
use crate::value::ConstValue;

/// How a method binds when looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodKind {
    Instance,
    Class,
    Static,
}

/// A property's accessor triple. Absent accessors are vacuously empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub getter: Option<Callable>,
    pub setter: Option<Callable>,
    pub deleter: Option<Callable>,
}

impl PropertyDef {
    pub fn new() -> Self {
        PropertyDef {
            getter: None,
            setter: None,
            deleter: None,
        }
    }

    pub fn with_getter(mut self, getter: Callable) -> Self {
        self.getter = Some(getter);
        self
    }

    pub fn with_setter(mut self, setter: Callable) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn with_deleter(mut self, deleter: Callable) -> Self {
        self.deleter = Some(deleter);
        self
    }

    /// A placeholder read-only property: an empty getter named after the
    /// property.
    pub fn read_only(name: &str) -> Self {
        PropertyDef::new().with_getter(Callable::new(
            name,
            Signature::new::<_, String>([]),
            crate::body::Body::empty(),
        ))
    }

    /// A placeholder read-write property: empty getter and setter.
    pub fn read_write(name: &str) -> Self {
        PropertyDef::read_only(name).with_setter(Callable::new(
            name,
            Signature::new(["value"]),
            crate::body::Body::empty(),
        ))
    }

    /// The accessors that are present, in getter/setter/deleter order.
    pub fn accessors(&self) -> impl Iterator<Item = &Callable> {
        [&self.getter, &self.setter, &self.deleter]
            .into_iter()
            .filter_map(|a| a.as_ref())
    }
}

impl Default for PropertyDef {
    fn default() -> Self {
        Self::new()
    }
}

/// A declared namespace entry, before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MemberDecl {
    /// A data attribute declared but unset (annotation-style declaration).
    Attribute,
    /// A class-level constant. The unset placeholder value also counts as a
    /// plain attribute declaration.
    Value(ConstValue),
    Method { kind: MethodKind, func: Callable },
    Property(PropertyDef),
}

impl MemberDecl {
    /// Converts the declaration into a concrete (non-abstract) class member.
    pub fn into_class_member(self) -> ClassMember {
        match self {
            MemberDecl::Attribute => ClassMember::Value(ConstValue::Null),
            MemberDecl::Value(v) => ClassMember::Value(v),
            MemberDecl::Method { kind, func } => ClassMember::Method {
                kind,
                func,
                is_abstract: false,
            },
            MemberDecl::Property(def) => ClassMember::Property {
                def,
                is_abstract: false,
            },
        }
    }
}

/// A classified namespace entry as stored on a built class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassMember {
    Method {
        kind: MethodKind,
        func: Callable,
        is_abstract: bool,
    },
    Property {
        def: PropertyDef,
        is_abstract: bool,
    },
    /// The patched stored-attribute accessor: reads and writes the instance
    /// dict under its own name. Replaces interface properties a concrete
    /// class did not provide.
    AttributeAccessor { name: String },
    /// A class-level constant value.
    Value(ConstValue),
}

impl ClassMember {
    /// Returns `true` for descriptor members (anything with lookup
    /// behavior: methods, properties, attribute accessors).
    pub fn is_descriptor(&self) -> bool {
        !matches!(self, ClassMember::Value(_))
    }

    /// Returns `true` for members still awaiting an implementation.
    pub fn is_abstract(&self) -> bool {
        matches!(
            self,
            ClassMember::Method {
                is_abstract: true,
                ..
            } | ClassMember::Property {
                is_abstract: true,
                ..
            }
        )
    }
}

/// A class declaration handed to the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<ClassId>,
    pub members: IndexMap<String, MemberDecl>,
    /// Suppresses the incomplete-implementation diagnostics for classes
    /// that are deliberately not finished yet. Consumed at construction;
    /// never stored on the class.
    pub partial_implementation: bool,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        ClassDef {
            name: name.into(),
            bases: Vec::new(),
            members: IndexMap::new(),
            partial_implementation: false,
        }
    }

    pub fn base(mut self, base: ClassId) -> Self {
        self.bases.push(base);
        self
    }

    /// Declares an instance method; the member name is the callable's name.
    pub fn method(mut self, func: Callable) -> Self {
        self.members.insert(
            func.name.clone(),
            MemberDecl::Method {
                kind: MethodKind::Instance,
                func,
            },
        );
        self
    }

    pub fn class_method(mut self, func: Callable) -> Self {
        self.members.insert(
            func.name.clone(),
            MemberDecl::Method {
                kind: MethodKind::Class,
                func,
            },
        );
        self
    }

    pub fn static_method(mut self, func: Callable) -> Self {
        self.members.insert(
            func.name.clone(),
            MemberDecl::Method {
                kind: MethodKind::Static,
                func,
            },
        );
        self
    }

    pub fn property_def(mut self, name: impl Into<String>, def: PropertyDef) -> Self {
        self.members.insert(name.into(), MemberDecl::Property(def));
        self
    }

    /// Declares an unset data attribute.
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.members.insert(name.into(), MemberDecl::Attribute);
        self
    }

    /// Declares a class-level constant.
    pub fn value(mut self, name: impl Into<String>, value: ConstValue) -> Self {
        self.members.insert(name.into(), MemberDecl::Value(value));
        self
    }

    pub fn partial_implementation(mut self) -> Self {
        self.partial_implementation = true;
        self
    }
}

/// The member classifier's output for an interface namespace.
#[derive(Debug, Clone)]
pub struct ClassifiedNamespace {
    /// The rewritten namespace: every retained member wrapped as abstract.
    pub members: IndexMap<String, ClassMember>,
    /// Every callable that must pass the emptiness verifier (methods plus
    /// property accessors).
    pub functions: Vec<Callable>,
    pub method_signatures: IndexMap<String, Signature>,
    pub property_names: BTreeSet<String>,
    pub attribute_names: BTreeSet<String>,
}

/// Partitions an interface's declared namespace.
///
/// Unset attribute declarations (and the unset placeholder value) become
/// plain attribute names and are not retained as class members. Methods and
/// properties are wrapped as abstract with their signatures recorded, and
/// their callables collected for the aggregate emptiness check. Any other
/// value is a declaration error.
pub fn classify_interface_namespace(
    members: IndexMap<String, MemberDecl>,
) -> Result<ClassifiedNamespace, CoreError> {
    let mut out = ClassifiedNamespace {
        members: IndexMap::new(),
        functions: Vec::new(),
        method_signatures: IndexMap::new(),
        property_names: BTreeSet::new(),
        attribute_names: BTreeSet::new(),
    };
    for (name, decl) in members {
        match decl {
            MemberDecl::Attribute => {
                out.attribute_names.insert(name);
            }
            MemberDecl::Value(v) if v.is_null() => {
                out.attribute_names.insert(name);
            }
            MemberDecl::Value(value) => {
                return Err(CoreError::InvalidMemberValue { name, value });
            }
            MemberDecl::Method { kind, func } => {
                out.functions.push(func.clone());
                out.method_signatures
                    .insert(name.clone(), func.signature.clone());
                out.members.insert(
                    name,
                    ClassMember::Method {
                        kind,
                        func,
                        is_abstract: true,
                    },
                );
            }
            MemberDecl::Property(def) => {
                out.functions.extend(def.accessors().cloned());
                out.property_names.insert(name.clone());
                out.members.insert(
                    name,
                    ClassMember::Property {
                        def,
                        is_abstract: true,
                    },
                );
            }
        }
    }
    Ok(out)
}
