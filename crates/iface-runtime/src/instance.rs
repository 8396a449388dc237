//! Instances, interface-only views, and attribute resolution.
//!
//! An [`Instance`] is an attribute map tied to a concrete class. Creation
//! goes through [`ClassRegistry::instantiate`], which runs the instance
//! guard: after the caller's initializer, every patched interface property
//! and every interface-declared attribute must be exposed, or construction
//! fails naming the class and the missing member.
//!
//! An [`InterfaceView`] restricts attribute access to exactly an
//! interface's declared member names; everything else fails with an error
//! naming the interface, not the wrapped implementation's type.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use iface_core::id::ClassId;
use iface_core::member::ClassMember;
use iface_core::value::ConstValue;

use crate::error::InterfaceError;
use crate::registry::ClassRegistry;

/// An object: attribute storage plus the class it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub class: ClassId,
    /// Instance attribute storage ("the instance dict").
    pub attrs: IndexMap<String, ConstValue>,
}

impl Instance {
    /// Raw constructor for adapter implementations that assemble an
    /// instance directly; normal construction goes through
    /// [`ClassRegistry::instantiate`].
    pub fn raw(class: ClassId) -> Self {
        Instance {
            class,
            attrs: IndexMap::new(),
        }
    }

    /// Stores an attribute under `name` in the instance dict.
    pub fn set(&mut self, name: impl Into<String>, value: ConstValue) {
        self.attrs.insert(name.into(), value);
    }
}

/// A member-restricted projection of an object onto an interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceView {
    /// The interface whose members the view exposes.
    pub interface: ClassId,
    /// The memoized per-interface view class.
    pub view_class: ClassId,
    pub inner: Box<Object>,
}

/// Either a plain instance or an interface-only view of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Object {
    Instance(Instance),
    View(InterfaceView),
}

impl Object {
    /// The runtime class used for adapter lookup and structural checks.
    pub fn class_of(&self) -> ClassId {
        match self {
            Object::Instance(instance) => instance.class,
            Object::View(view) => view.view_class,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Object::Instance(instance) => Some(instance),
            Object::View(_) => None,
        }
    }
}

impl From<Instance> for Object {
    fn from(instance: Instance) -> Self {
        Object::Instance(instance)
    }
}

impl ClassRegistry {
    /// Constructs an instance of a concrete class.
    ///
    /// The caller's initializer closure populates the instance; afterwards
    /// the instance guard verifies that every patched interface property and
    /// every interface-declared attribute was established.
    ///
    /// Interfaces refuse instantiation unconditionally, including interfaces
    /// with no declared members.
    pub fn instantiate<F>(&self, class: ClassId, init: F) -> Result<Instance, InterfaceError>
    where
        F: FnOnce(&mut Instance),
    {
        let class_def = self
            .get(class)
            .ok_or(InterfaceError::UnknownClass { id: class })?;
        if class_def.descriptor.is_interface {
            return Err(InterfaceError::InterfaceInstantiation {
                name: class_def.name.clone(),
            });
        }

        let mut instance = Instance::raw(class);
        init(&mut instance);

        for attribute in class_def
            .descriptor
            .abstract_properties
            .iter()
            .chain(class_def.descriptor.attribute_names.iter())
        {
            if !self.instance_has_attr(&instance, attribute) {
                return Err(InterfaceError::MissingRequiredAttribute {
                    class: class_def.name.clone(),
                    attribute: attribute.clone(),
                });
            }
        }
        Ok(instance)
    }

    // -----------------------------------------------------------------------
    // Attribute resolution
    // -----------------------------------------------------------------------

    /// First definition of `name` along the class's MRO.
    pub(crate) fn lookup_member(&self, class: ClassId, name: &str) -> Option<&ClassMember> {
        let class_def = self.get(class)?;
        class_def
            .mro
            .iter()
            .find_map(|&c| self.class(c).namespace.get(name))
    }

    /// Returns `true` if `name` resolves to something callable on the class.
    pub(crate) fn resolves_callable(&self, class: ClassId, name: &str) -> bool {
        matches!(
            self.lookup_member(class, name),
            Some(ClassMember::Method { .. })
        )
    }

    fn instance_has_attr(&self, instance: &Instance, name: &str) -> bool {
        if instance.attrs.contains_key(name) {
            return true;
        }
        match self.lookup_member(instance.class, name) {
            Some(ClassMember::Value(_)) | Some(ClassMember::Method { .. }) => true,
            Some(ClassMember::Property { def, .. }) => def.getter.is_some(),
            // The stored-attribute accessor only answers for values actually
            // stored on the instance.
            Some(ClassMember::AttributeAccessor { .. }) | None => false,
        }
    }

    /// Returns `true` if the object exposes `name`. View access is limited
    /// to the interface's declared member names.
    pub fn has_attr(&self, obj: &Object, name: &str) -> bool {
        match obj {
            Object::Instance(instance) => self.instance_has_attr(instance, name),
            Object::View(view) => {
                self.class(view.interface)
                    .descriptor
                    .interface_names()
                    .contains(name)
                    && self.has_attr(&view.inner, name)
            }
        }
    }

    /// Resolves a stored data attribute. Callables are not evaluated: a
    /// name backed only by a method or a property body is not stored data.
    pub fn get_attr(&self, obj: &Object, name: &str) -> Result<ConstValue, InterfaceError> {
        match obj {
            Object::Instance(instance) => {
                if let Some(value) = instance.attrs.get(name) {
                    return Ok(value.clone());
                }
                match self.lookup_member(instance.class, name) {
                    Some(ClassMember::Value(value)) => Ok(value.clone()),
                    _ => Err(InterfaceError::NoSuchAttribute {
                        owner: self.class(instance.class).name.clone(),
                        name: name.to_string(),
                    }),
                }
            }
            Object::View(view) => {
                let interface = self.class(view.interface);
                if interface.descriptor.interface_names().contains(name) {
                    self.get_attr(&view.inner, name)
                } else {
                    Err(InterfaceError::NoInterfaceAttribute {
                        interface: interface.name.clone(),
                        name: name.to_string(),
                    })
                }
            }
        }
    }

    /// Stores a data attribute. On a view, only the interface's declared
    /// members are assignable, and the store lands on the wrapped instance.
    pub fn set_attr(
        &self,
        obj: &mut Object,
        name: &str,
        value: ConstValue,
    ) -> Result<(), InterfaceError> {
        match obj {
            Object::Instance(instance) => {
                instance.set(name, value);
                Ok(())
            }
            Object::View(view) => {
                let interface = self.class(view.interface);
                if interface.descriptor.interface_names().contains(name) {
                    self.set_attr(&mut view.inner, name, value)
                } else {
                    Err(InterfaceError::NoInterfaceAttribute {
                        interface: interface.name.clone(),
                        name: name.to_string(),
                    })
                }
            }
        }
    }
}
