//! Structural conformance: duck-type checks against an interface's declared
//! member names.
//!
//! Conformance is a capability query over name sets: every declared method
//! must resolve to something callable on the candidate's runtime type, and
//! every declared property or attribute must be present. Class-level checks
//! are cached per (interface, type) once true; the first success records a
//! one-time advisory recommending explicit inheritance or registration.

use iface_core::id::ClassId;

use crate::diagnostics::Diagnostic;
use crate::error::InterfaceError;
use crate::instance::Object;
use crate::registry::ClassRegistry;

impl ClassRegistry {
    /// Returns `true` if `obj` provides `interface`.
    ///
    /// Equivalent to a nominal instance-of check unless `allow_implicit` is
    /// set, in which case structural conformance also counts. Errs when
    /// called on a non-interface.
    pub fn provided_by(
        &mut self,
        interface: ClassId,
        obj: &Object,
        allow_implicit: bool,
    ) -> Result<bool, InterfaceError> {
        let Some(class) = self.get(interface) else {
            return Err(InterfaceError::UnknownClass { id: interface });
        };
        if !class.descriptor.is_interface {
            return Err(InterfaceError::NotAnInterface {
                name: class.name.clone(),
            });
        }
        if self.nominal_instance_of(obj, interface) {
            return Ok(true);
        }
        if !allow_implicit {
            return Ok(false);
        }
        if self.structural_class_check(interface, obj.class_of()) {
            return Ok(true);
        }
        Ok(self.structural_instance_check(interface, obj))
    }

    /// Nominal instance-of: the object's class inherits the interface, or
    /// the object is a view onto it (or onto one of its sub-interfaces).
    fn nominal_instance_of(&self, obj: &Object, interface: ClassId) -> bool {
        match obj {
            Object::Instance(instance) => {
                self.class(instance.class).mro.contains(&interface)
            }
            Object::View(view) => self.class(view.interface).mro.contains(&interface),
        }
    }

    /// Instance-level duck-type check: methods resolve as callables on the
    /// runtime type, data members are present on the instance itself.
    pub(crate) fn structural_instance_check(&self, interface: ClassId, obj: &Object) -> bool {
        let descriptor = &self.class(interface).descriptor;
        for method in &descriptor.method_names {
            if !self.resolves_callable(obj.class_of(), method) {
                return false;
            }
        }
        for attr in descriptor.props_and_attrs() {
            if !self.has_attr(obj, &attr) {
                return false;
            }
        }
        true
    }

    /// Type-level duck-type check, cached per (interface, type) once true.
    ///
    /// The first success for a pair records a [`Diagnostic`] advising
    /// explicit inheritance or registration; the cache keeps the advisory
    /// one-time.
    pub(crate) fn structural_class_check(&mut self, interface: ClassId, candidate: ClassId) -> bool {
        if self.class(interface).structural_subclasses.contains(&candidate) {
            return true;
        }
        let descriptor = &self.class(interface).descriptor;
        for method in &descriptor.method_names {
            if !self.resolves_callable(candidate, method) {
                return false;
            }
        }
        for attr in descriptor.props_and_attrs() {
            // Class-level presence: any member definition answers, a
            // patched accessor included (it resolves to itself on the
            // class).
            if self.lookup_member(candidate, &attr).is_none() {
                return false;
            }
        }
        self.class_mut(interface)
            .structural_subclasses
            .insert(candidate);
        let diagnostic = Diagnostic::StructuralConformance {
            interface: self.class(interface).name.clone(),
            class: self.class(candidate).name.clone(),
        };
        self.emit(diagnostic);
        true
    }
}
