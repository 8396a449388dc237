//! Built classes and their interface descriptors.
//!
//! An [`InterfaceDescriptor`] is attached to every class at construction:
//! the aggregated member name-sets and method signatures from all interface
//! ancestors, plus the interface/concrete classification. The descriptor is
//! immutable after construction; the adapter table, the structural-subclass
//! cache and the memoized wrapper type accrue over the class's lifetime.

use std::collections::{BTreeSet, HashSet};
use std::rc::Weak;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use iface_core::id::ClassId;
use iface_core::member::ClassMember;
use iface_core::signature::Signature;

use crate::adapt::AdapterFn;

/// Per-class interface metadata, derived once at class construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    /// Whether this class is a pure interface.
    pub is_interface: bool,
    /// Interface-declared callables (any kind), merged from all ancestors.
    pub method_names: BTreeSet<String>,
    /// Interface-declared properties.
    pub property_names: BTreeSet<String>,
    /// Interface-declared plain data attributes.
    pub attribute_names: BTreeSet<String>,
    /// One signature per declared method; all ancestors contribute,
    /// least-derived first.
    pub method_signatures: IndexMap<String, Signature>,
    /// Interface properties patched to stored-attribute accessors on this
    /// concrete class or one of its ancestors. Always empty on interfaces.
    pub abstract_properties: BTreeSet<String>,
}

impl InterfaceDescriptor {
    /// A descriptor with no members.
    pub fn empty(is_interface: bool) -> Self {
        InterfaceDescriptor {
            is_interface,
            method_names: BTreeSet::new(),
            property_names: BTreeSet::new(),
            attribute_names: BTreeSet::new(),
            method_signatures: IndexMap::new(),
            abstract_properties: BTreeSet::new(),
        }
    }

    /// Every interface-declared member name.
    pub fn interface_names(&self) -> BTreeSet<String> {
        let mut names = self.method_names.clone();
        names.extend(self.property_names.iter().cloned());
        names.extend(self.attribute_names.iter().cloned());
        names
    }

    /// Property and plain-attribute names (the members an instance must
    /// expose as data).
    pub fn props_and_attrs(&self) -> BTreeSet<String> {
        let mut names = self.property_names.clone();
        names.extend(self.attribute_names.iter().cloned());
        names
    }
}

/// A class built by the registry.
#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    /// Direct bases, in declaration order.
    pub bases: Vec<ClassId>,
    /// Method resolution order, self first, subclass before base.
    pub mro: Vec<ClassId>,
    /// The classified namespace. For concrete classes, unresolved interface
    /// properties have been replaced with `AttributeAccessor` entries.
    pub namespace: IndexMap<String, ClassMember>,
    pub descriptor: InterfaceDescriptor,
    /// Set on synthesized interface-only view classes: the interface the
    /// view projects.
    pub wrapper_of: Option<ClassId>,

    /// Registered conversions to this interface. Entries hold non-owning
    /// references and expire when the registering handle is dropped.
    pub(crate) adapters: IndexMap<ClassId, Weak<AdapterFn>>,
    /// Types that passed structural matching at least once.
    pub(crate) structural_subclasses: HashSet<ClassId>,
    /// Memoized interface-only view class.
    pub(crate) wrapper_type: Option<ClassId>,
}

impl Class {
    pub(crate) fn new(
        name: String,
        bases: Vec<ClassId>,
        mro: Vec<ClassId>,
        namespace: IndexMap<String, ClassMember>,
        descriptor: InterfaceDescriptor,
        wrapper_of: Option<ClassId>,
    ) -> Self {
        Class {
            name,
            bases,
            mro,
            namespace,
            descriptor,
            wrapper_of,
            adapters: IndexMap::new(),
            structural_subclasses: HashSet::new(),
            wrapper_type: None,
        }
    }

    /// Looks up a member declared directly on this class.
    pub fn own_member(&self, name: &str) -> Option<&ClassMember> {
        self.namespace.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_names_is_the_union_of_all_three_sets() {
        let mut d = InterfaceDescriptor::empty(true);
        d.method_names.insert("speak".into());
        d.property_names.insert("height".into());
        d.attribute_names.insert("weight".into());

        let names = d.interface_names();
        assert_eq!(names.len(), 3);
        assert!(names.contains("speak"));
        assert!(names.contains("height"));
        assert!(names.contains("weight"));

        let data = d.props_and_attrs();
        assert_eq!(data.len(), 2);
        assert!(!data.contains("speak"));
    }

    #[test]
    fn empty_descriptor_has_no_members() {
        let d = InterfaceDescriptor::empty(false);
        assert!(!d.is_interface);
        assert!(d.interface_names().is_empty());
        assert!(d.abstract_properties.is_empty());
    }

    #[test]
    fn descriptor_round_trips_through_json() {
        let mut d = InterfaceDescriptor::empty(true);
        d.method_names.insert("speak".into());
        d.property_names.insert("height".into());
        d.method_signatures
            .insert("speak".into(), Signature::new(["volume"]));

        let json = serde_json::to_string(&d).unwrap();
        let back: InterfaceDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
