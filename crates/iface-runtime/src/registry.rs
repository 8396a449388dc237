//! The class registry and the class-construction pipeline.
//!
//! [`ClassRegistry`] is the single entry point for declaring classes. Every
//! [`define`](ClassRegistry::define) call runs the full classifier pipeline:
//! it decides whether the new class is a pure interface or a concrete
//! implementation, aggregates member metadata from all interface ancestors,
//! verifies interface bodies are empty and override signatures consistent,
//! patches unimplemented interface properties into stored-attribute
//! accessors, and attaches the resulting [`InterfaceDescriptor`] to the
//! class.
//!
//! Two classes are pre-registered:
//! - `ClassId(0)` = `Interface`, the root interface. Inheriting it (directly
//!   or through another interface) opts a class into the machinery.
//! - `ClassId(1)` = `Concrete`, a plain concrete marker class. Listing it
//!   first among bases keeps inheritance-order-sensitive tooling satisfied
//!   and votes the class concrete; it carries no members.
//!
//! The registry is single-threaded and synchronous; callers serialize
//! concurrent class loading themselves.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::Bfs;
use petgraph::Directed;

use iface_core::body::is_empty_function;
use iface_core::id::ClassId;
use iface_core::member::{classify_interface_namespace, ClassDef, ClassMember, MemberDecl};
use iface_core::signature::{signatures_consistent, Signature};

use crate::class::{Class, InterfaceDescriptor};
use crate::diagnostics::{Config, Diagnostic};
use crate::error::InterfaceError;

/// Registry of all declared classes, their hierarchy, and the process-wide
/// diagnostic sink.
#[derive(Debug)]
pub struct ClassRegistry {
    /// Classes indexed by ClassId.0.
    pub(crate) classes: Vec<Class>,
    /// Inheritance DAG: one node per class, one base -> derived edge per
    /// direct base.
    pub(crate) hierarchy: StableGraph<ClassId, (), Directed, u32>,
    /// Named class lookup.
    names: HashMap<String, ClassId>,
    pub(crate) config: Config,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl ClassRegistry {
    /// The root interface class.
    pub const INTERFACE: ClassId = ClassId(0);
    /// The concrete ordering-marker class.
    pub const CONCRETE: ClassId = ClassId(1);

    /// Creates a registry with the default (development-mode) configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a registry with an explicit configuration. The configuration
    /// is fixed for the registry's lifetime.
    pub fn with_config(config: Config) -> Self {
        let mut registry = ClassRegistry {
            classes: Vec::new(),
            hierarchy: StableGraph::new(),
            names: HashMap::new(),
            config,
            diagnostics: Vec::new(),
        };
        // Bootstrap the two built-in classes. The root interface is the one
        // class that is an interface without an interface base.
        registry.push_class(Class::new(
            "Interface".to_string(),
            Vec::new(),
            vec![Self::INTERFACE],
            IndexMap::new(),
            InterfaceDescriptor::empty(true),
            None,
        ));
        registry.push_class(Class::new(
            "Concrete".to_string(),
            Vec::new(),
            vec![Self::CONCRETE],
            IndexMap::new(),
            InterfaceDescriptor::empty(false),
            None,
        ));
        registry
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Looks up a class by its [`ClassId`].
    pub fn get(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(id.0 as usize)
    }

    /// Looks up a class's [`ClassId`] by name.
    pub fn get_by_name(&self, name: &str) -> Option<ClassId> {
        self.names.get(name).copied()
    }

    /// The registry configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// All advisory diagnostics recorded so far, in emission order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The incomplete-implementation messages, formatted for tooling.
    pub fn missing_member_warnings(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::IncompleteImplementation { .. }))
            .map(|d| d.to_string())
            .collect()
    }

    pub(crate) fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.0 as usize]
    }

    pub(crate) fn class_mut(&mut self, id: ClassId) -> &mut Class {
        &mut self.classes[id.0 as usize]
    }

    /// Records an advisory diagnostic, warning through `tracing` in
    /// development mode.
    pub(crate) fn emit(&mut self, diagnostic: Diagnostic) {
        if self.config.is_development() {
            tracing::warn!("{diagnostic}");
        }
        self.diagnostics.push(diagnostic);
    }

    // -----------------------------------------------------------------------
    // Query API
    // -----------------------------------------------------------------------

    /// Returns `true` if the class is a pure interface.
    pub fn is_interface(&self, id: ClassId) -> bool {
        self.get(id).is_some_and(|c| c.descriptor.is_interface)
    }

    /// All interface ancestors of a class, in MRO order, the class itself
    /// included when it is an interface. The root interface is excluded.
    pub fn interfaces_of(&self, id: ClassId) -> Vec<ClassId> {
        let Some(class) = self.get(id) else {
            return Vec::new();
        };
        class
            .mro
            .iter()
            .copied()
            .filter(|&c| c != Self::INTERFACE && self.class(c).descriptor.is_interface)
            .collect()
    }

    /// The interface's declared method names; empty for non-interfaces.
    pub fn interface_method_names(&self, id: ClassId) -> BTreeSet<String> {
        self.interface_set(id, |d| d.method_names.clone())
    }

    /// The interface's declared property names; empty for non-interfaces.
    pub fn interface_property_names(&self, id: ClassId) -> BTreeSet<String> {
        self.interface_set(id, |d| d.property_names.clone())
    }

    /// The interface's declared plain-attribute names; empty for
    /// non-interfaces.
    pub fn interface_attribute_names(&self, id: ClassId) -> BTreeSet<String> {
        self.interface_set(id, |d| d.attribute_names.clone())
    }

    /// The interface's property and attribute names; empty for
    /// non-interfaces.
    pub fn interface_props_and_attrs(&self, id: ClassId) -> BTreeSet<String> {
        self.interface_set(id, |d| d.props_and_attrs())
    }

    fn interface_set<F>(&self, id: ClassId, select: F) -> BTreeSet<String>
    where
        F: Fn(&InterfaceDescriptor) -> BTreeSet<String>,
    {
        match self.get(id) {
            Some(class) if class.descriptor.is_interface => select(&class.descriptor),
            _ => BTreeSet::new(),
        }
    }

    /// All interface subclasses of `id` currently registered, nearest
    /// first (callers reverse for most-derived-first scans).
    pub(crate) fn interface_subclasses(&self, id: ClassId) -> Vec<ClassId> {
        let mut out = Vec::new();
        let mut bfs = Bfs::new(&self.hierarchy, id.into());
        while let Some(node) = bfs.next(&self.hierarchy) {
            let sub: ClassId = node.into();
            if sub != id && self.class(sub).descriptor.is_interface {
                out.push(sub);
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Class construction
    // -----------------------------------------------------------------------

    /// Builds a class from its declaration, running the full classifier
    /// pipeline, and returns its new [`ClassId`].
    pub fn define(&mut self, def: ClassDef) -> Result<ClassId, InterfaceError> {
        let ClassDef {
            name,
            bases,
            members,
            partial_implementation,
        } = def;

        for &base in &bases {
            if self.get(base).is_none() {
                return Err(InterfaceError::UnknownClass { id: base });
            }
        }
        if self.names.contains_key(&name) {
            return Err(InterfaceError::DuplicateClassName { name });
        }

        let ancestors = self.linearize(&bases);
        let participates = ancestors.contains(&Self::INTERFACE);
        if !participates {
            // A plain class: the machinery stays out of the way entirely.
            let namespace = members
                .into_iter()
                .map(|(n, d)| (n, d.into_class_member()))
                .collect();
            return Ok(self.push_named_class(Class::new(
                name,
                bases,
                ancestors, // self id prepended by push_named_class
                namespace,
                InterfaceDescriptor::empty(false),
                None,
            )));
        }

        let type_is_interface = bases
            .iter()
            .all(|&b| self.class(b).descriptor.is_interface);

        // Aggregate member metadata from all ancestors, least-derived first,
        // so more specific ancestors extend without re-declaring. Interface
        // descriptors are already aggregated at their own construction, so
        // the direct bases carry everything.
        let mut signatures: IndexMap<String, Signature> = IndexMap::new();
        let mut property_names: BTreeSet<String> = BTreeSet::new();
        let mut attribute_names: BTreeSet<String> = BTreeSet::new();
        let mut base_abstract_properties: BTreeSet<String> = BTreeSet::new();
        for &base in bases.iter().rev() {
            let base_class = self.class(base);
            base_abstract_properties
                .extend(base_class.descriptor.abstract_properties.iter().cloned());
            if base_class.descriptor.is_interface {
                for (method, signature) in &base_class.descriptor.method_signatures {
                    signatures.insert(method.clone(), signature.clone());
                }
                property_names.extend(base_class.descriptor.property_names.iter().cloned());
                attribute_names.extend(base_class.descriptor.attribute_names.iter().cloned());
            } else if !base_class.mro.contains(&Self::INTERFACE)
                && self.config.is_development()
            {
                // A plain mixin base never went through these checks at its
                // own construction; catch contract breaks it carries.
                check_namespace_overrides(
                    &base_class.namespace,
                    &base_class.name,
                    &signatures,
                )?;
            }
        }

        if self.config.is_development() {
            check_declared_overrides(&members, &name, &signatures)?;
        }

        let namespace = if type_is_interface {
            let classified = classify_interface_namespace(members)?;
            for (method, signature) in classified.method_signatures {
                signatures.insert(method, signature);
            }
            property_names.extend(classified.property_names);
            attribute_names.extend(classified.attribute_names);
            for func in &classified.functions {
                if !is_empty_function(func, self.config.unwrap_decorators) {
                    return Err(InterfaceError::FunctionNotEmpty {
                        name: func.name.clone(),
                    });
                }
            }
            classified.members
        } else {
            members
                .into_iter()
                .map(|(n, d)| (n, d.into_class_member()))
                .collect()
        };

        let mut descriptor = InterfaceDescriptor {
            is_interface: type_is_interface,
            method_names: signatures.keys().cloned().collect(),
            property_names,
            attribute_names,
            method_signatures: signatures,
            abstract_properties: BTreeSet::new(),
        };

        let mut namespace = namespace;
        let mut missing_members: Vec<String> = Vec::new();
        if !type_is_interface {
            // A descriptor defined directly on this class always wins over
            // the stored-attribute patch.
            let own_descriptors: BTreeSet<String> = namespace
                .iter()
                .filter(|(_, m)| m.is_descriptor())
                .map(|(n, _)| n.clone())
                .collect();
            base_abstract_properties.retain(|n| !own_descriptors.contains(n));

            let mut patched: BTreeSet<String> = BTreeSet::new();
            let required: Vec<String> = descriptor
                .method_names
                .iter()
                .chain(descriptor.property_names.iter())
                .cloned()
                .collect();
            for member_name in required {
                let resolved = namespace
                    .get(&member_name)
                    .or_else(|| self.resolve_on_ancestors(&ancestors, &member_name))
                    .map(|m| (m.is_abstract(), matches!(m, ClassMember::Property { .. })));
                match resolved {
                    Some((true, true)) => {
                        namespace.insert(
                            member_name.clone(),
                            ClassMember::AttributeAccessor {
                                name: member_name.clone(),
                            },
                        );
                        patched.insert(member_name);
                    }
                    Some((true, false)) | None => missing_members.push(member_name),
                    Some((false, _)) => {}
                }
            }
            patched.extend(base_abstract_properties);
            descriptor.abstract_properties = patched;
        }

        let id = self.push_named_class(Class::new(
            name.clone(),
            bases,
            ancestors,
            namespace,
            descriptor,
            None,
        ));

        if !type_is_interface && self.config.is_development() && !partial_implementation {
            for member in missing_members {
                self.emit(Diagnostic::IncompleteImplementation {
                    class: name.clone(),
                    member,
                });
            }
        }
        Ok(id)
    }

    /// First member definition for `name` along the ancestor chain.
    fn resolve_on_ancestors(&self, ancestors: &[ClassId], name: &str) -> Option<&ClassMember> {
        ancestors
            .iter()
            .find_map(|&c| self.class(c).namespace.get(name))
    }

    /// Merges the bases' linearizations: concatenate in declaration order,
    /// keep the last occurrence of each class, so a subclass always precedes
    /// its bases.
    fn linearize(&self, bases: &[ClassId]) -> Vec<ClassId> {
        let mut merged: Vec<ClassId> = Vec::new();
        for &base in bases {
            merged.extend(self.class(base).mro.iter().copied());
        }
        let mut seen: BTreeSet<ClassId> = BTreeSet::new();
        let mut out: Vec<ClassId> = Vec::new();
        for &class in merged.iter().rev() {
            if seen.insert(class) {
                out.push(class);
            }
        }
        out.reverse();
        out
    }

    /// Adds a class to the storage, the hierarchy graph and the name table,
    /// prepending the freshly allocated id to the ancestor list.
    fn push_named_class(&mut self, mut class: Class) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        class.mro.insert(0, id);
        let bases = class.bases.clone();
        self.names.insert(class.name.clone(), id);
        self.classes.push(class);
        let node = self.hierarchy.add_node(id);
        debug_assert_eq!(ClassId::from(node), id);
        for base in bases {
            self.hierarchy.add_edge(base.into(), id.into(), ());
        }
        id
    }

    /// Bootstrap-only variant: the class's mro is already complete.
    fn push_class(&mut self, class: Class) {
        let id = ClassId(self.classes.len() as u32);
        self.names.insert(class.name.clone(), id);
        self.classes.push(class);
        let node = self.hierarchy.add_node(id);
        debug_assert_eq!(ClassId::from(node), id);
    }

    /// Synthesizes the memoized interface-only view class for `interface`.
    pub(crate) fn wrapper_class_for(&mut self, interface: ClassId) -> ClassId {
        if let Some(wrapper) = self.class(interface).wrapper_type {
            return wrapper;
        }
        let wrapper_name = format!("{}Only", self.class(interface).name);
        let mut wrapper = Class::new(
            wrapper_name,
            Vec::new(),
            Vec::new(),
            IndexMap::new(),
            InterfaceDescriptor::empty(false),
            Some(interface),
        );
        let id = ClassId(self.classes.len() as u32);
        wrapper.mro.insert(0, id);
        self.classes.push(wrapper);
        let node = self.hierarchy.add_node(id);
        debug_assert_eq!(ClassId::from(node), id);
        self.class_mut(interface).wrapper_type = Some(id);
        id
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks a declared namespace's method overrides against the aggregated
/// interface signatures.
fn check_declared_overrides(
    members: &IndexMap<String, MemberDecl>,
    class_name: &str,
    signatures: &IndexMap<String, Signature>,
) -> Result<(), InterfaceError> {
    for (method, base_signature) in signatures {
        let Some(decl) = members.get(method) else {
            continue;
        };
        match decl {
            MemberDecl::Method { func, .. } => {
                if !signatures_consistent(&func.signature, base_signature) {
                    return Err(InterfaceError::SignatureMismatch {
                        class: class_name.to_string(),
                        method: method.clone(),
                    });
                }
            }
            // Descriptors may legitimately shadow interface methods.
            MemberDecl::Property(_) => {}
            MemberDecl::Attribute | MemberDecl::Value(_) => {
                return Err(InterfaceError::MethodOverriddenWithNonMethod {
                    class: class_name.to_string(),
                    name: method.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Same check against an already-built class's namespace (used for plain
/// mixin bases that never went through the pipeline with these signatures).
fn check_namespace_overrides(
    namespace: &IndexMap<String, ClassMember>,
    class_name: &str,
    signatures: &IndexMap<String, Signature>,
) -> Result<(), InterfaceError> {
    for (method, base_signature) in signatures {
        let Some(member) = namespace.get(method) else {
            continue;
        };
        match member {
            ClassMember::Method { func, .. } => {
                if !signatures_consistent(&func.signature, base_signature) {
                    return Err(InterfaceError::SignatureMismatch {
                        class: class_name.to_string(),
                        method: method.clone(),
                    });
                }
            }
            ClassMember::Property { .. } | ClassMember::AttributeAccessor { .. } => {}
            ClassMember::Value(_) => {
                return Err(InterfaceError::MethodOverriddenWithNonMethod {
                    class: class_name.to_string(),
                    name: method.clone(),
                });
            }
        }
    }
    Ok(())
}
