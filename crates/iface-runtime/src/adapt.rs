//! Adapter registration and the `adapt` family of conversions.
//!
//! Adapters are conversion callbacks registered per (source class, target
//! interface) pair. The registry stores them as weak references keyed on the
//! source class; the caller keeps the returned [`AdapterHandle`] alive for as
//! long as the registration should stand, and a dropped handle expires the
//! entry without any explicit deregistration step.
//!
//! Lookup walks the source object's MRO outermost-first and, for each
//! ancestor, prefers an adapter registered on a sub-interface of the target
//! over one registered on the target itself, so the most specific conversion
//! wins.

use std::rc::{Rc, Weak};

use iface_core::id::ClassId;

use crate::error::InterfaceError;
use crate::instance::Object;
use crate::registry::ClassRegistry;

/// An adapter callback: converts an object into one providing the target
/// interface. Adapters receive the registry for lookups but must not define
/// classes from inside a conversion.
pub type AdapterFn = dyn Fn(&ClassRegistry, &Object) -> Result<Object, InterfaceError>;

/// Owning handle for a registered adapter.
///
/// The registry holds only a weak reference; dropping the last handle
/// retires the registration.
pub struct AdapterHandle {
    adapter: Rc<AdapterFn>,
}

impl AdapterHandle {
    fn new(adapter: Rc<AdapterFn>) -> Self {
        AdapterHandle { adapter }
    }

    pub(crate) fn downgrade(&self) -> Weak<AdapterFn> {
        Rc::downgrade(&self.adapter)
    }
}

impl std::fmt::Debug for AdapterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterHandle").finish_non_exhaustive()
    }
}

impl ClassRegistry {
    /// Registers `adapter` to convert instances of `from` into objects
    /// providing the interface `to`.
    ///
    /// At most one live adapter may exist per (source, interface) pair; a
    /// pair whose previous handle has been dropped may be re-registered.
    pub fn register_adapter<F>(
        &mut self,
        adapter: F,
        from: ClassId,
        to: ClassId,
    ) -> Result<AdapterHandle, InterfaceError>
    where
        F: Fn(&ClassRegistry, &Object) -> Result<Object, InterfaceError> + 'static,
    {
        if self.get(from).is_none() {
            return Err(InterfaceError::UnknownClass { id: from });
        }
        let Some(target) = self.get(to) else {
            return Err(InterfaceError::UnknownClass { id: to });
        };
        if !target.descriptor.is_interface {
            return Err(InterfaceError::NotAnInterface {
                name: target.name.clone(),
            });
        }
        if let Some(existing) = target.adapters.get(&from) {
            if existing.upgrade().is_some() {
                return Err(InterfaceError::DuplicateAdapter {
                    class: self.class(from).name.clone(),
                    interface: target.name.clone(),
                });
            }
        }
        let handle = AdapterHandle::new(Rc::new(adapter));
        self.class_mut(to).adapters.insert(from, handle.downgrade());
        Ok(handle)
    }

    /// Registers an adapter class: `construct` builds an instance of
    /// `adapter_class` around the source object, and the target interface is
    /// inferred as the most-derived interface `adapter_class` inherits.
    pub fn register_class_adapter<F>(
        &mut self,
        adapter_class: ClassId,
        from: ClassId,
        construct: F,
    ) -> Result<AdapterHandle, InterfaceError>
    where
        F: Fn(&ClassRegistry, &Object) -> Result<Object, InterfaceError> + 'static,
    {
        let Some(class) = self.get(adapter_class) else {
            return Err(InterfaceError::UnknownClass { id: adapter_class });
        };
        let name = class.name.clone();
        let Some(&interface) = self.interfaces_of(adapter_class).first() else {
            return Err(InterfaceError::NoInterfacesProvided { class: name });
        };
        self.register_adapter(construct, from, interface)
    }

    /// Finds a live adapter converting `obj_type` (or one of its ancestors)
    /// to the interface `to`. Sub-interface registrations take precedence
    /// over the target's own, and a nearer source ancestor always beats a
    /// farther one.
    pub(crate) fn get_adapter(&self, to: ClassId, obj_type: ClassId) -> Option<Rc<AdapterFn>> {
        let mut tables = self.interface_subclasses(to);
        tables.reverse();
        tables.push(to);
        for &ancestor in &self.class(obj_type).mro {
            for &table in &tables {
                if let Some(adapter) = self
                    .class(table)
                    .adapters
                    .get(&ancestor)
                    .and_then(Weak::upgrade)
                {
                    return Some(adapter);
                }
            }
        }
        None
    }

    /// Adapts `obj` to the interface `to`.
    ///
    /// Returns `obj` unchanged when it already provides the interface
    /// (per [`provided_by`](Self::provided_by) with `allow_implicit`);
    /// otherwise runs the registered adapter and verifies its output. When
    /// `interface_only` is `true`, or unset in development mode, the result
    /// is wrapped in a view exposing only the interface's members.
    pub fn adapt(
        &mut self,
        to: ClassId,
        obj: &Object,
        allow_implicit: bool,
        interface_only: Option<bool>,
    ) -> Result<Object, InterfaceError> {
        let wrap = interface_only.unwrap_or_else(|| self.config.is_development());
        let adapted = if self.provided_by(to, obj, allow_implicit)? {
            obj.clone()
        } else {
            let Some(adapter) = self.get_adapter(to, obj.class_of()) else {
                return Err(InterfaceError::CannotAdapt {
                    class: self.class(obj.class_of()).name.clone(),
                    interface: self.class(to).name.clone(),
                });
            };
            let adapted = adapter(&*self, obj)?;
            if !self.provided_by(to, &adapted, allow_implicit)? {
                return Err(InterfaceError::AdapterOutputInvalid {
                    interface: self.class(to).name.clone(),
                });
            }
            adapted
        };
        if wrap {
            self.interface_only(to, adapted)
        } else {
            Ok(adapted)
        }
    }

    /// [`adapt`](Self::adapt), with adaptation failures flattened to `None`.
    /// Misuse errors (unknown class, non-interface target) still propagate.
    pub fn adapt_or_none(
        &mut self,
        to: ClassId,
        obj: &Object,
        allow_implicit: bool,
        interface_only: Option<bool>,
    ) -> Result<Option<Object>, InterfaceError> {
        match self.adapt(to, obj, allow_implicit, interface_only) {
            Ok(adapted) => Ok(Some(adapted)),
            Err(err) if err.is_adaptation_failure() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Returns `true` if [`adapt`](Self::adapt) would succeed.
    pub fn can_adapt(
        &mut self,
        to: ClassId,
        obj: &Object,
        allow_implicit: bool,
    ) -> Result<bool, InterfaceError> {
        Ok(self
            .adapt_or_none(to, obj, allow_implicit, Some(false))?
            .is_some())
    }

    /// Adapts each object in turn, skipping those that cannot be adapted.
    ///
    /// The returned iterator yields conversions in input order; adaptation
    /// failures are dropped silently, while errors from the adapter
    /// callbacks themselves surface as `Err` items.
    pub fn filter_adapt<I>(
        &mut self,
        objects: I,
        to: ClassId,
        allow_implicit: bool,
        interface_only: Option<bool>,
    ) -> Result<FilterAdapt<'_, I::IntoIter>, InterfaceError>
    where
        I: IntoIterator<Item = Object>,
    {
        let Some(target) = self.get(to) else {
            return Err(InterfaceError::UnknownClass { id: to });
        };
        if !target.descriptor.is_interface {
            return Err(InterfaceError::NotAnInterface {
                name: target.name.clone(),
            });
        }
        Ok(FilterAdapt {
            registry: self,
            objects: objects.into_iter(),
            to,
            allow_implicit,
            interface_only,
        })
    }

    /// Wraps `obj` in a view that exposes only the members declared by the
    /// interface `to`. The view class is synthesized once per interface and
    /// reused.
    pub fn interface_only(&mut self, to: ClassId, obj: Object) -> Result<Object, InterfaceError> {
        let Some(target) = self.get(to) else {
            return Err(InterfaceError::UnknownClass { id: to });
        };
        if !target.descriptor.is_interface {
            return Err(InterfaceError::NotAnInterface {
                name: target.name.clone(),
            });
        }
        let view_class = self.wrapper_class_for(to);
        Ok(Object::View(crate::instance::InterfaceView {
            interface: to,
            view_class,
            inner: Box::new(obj),
        }))
    }
}

/// Iterator returned by [`ClassRegistry::filter_adapt`].
pub struct FilterAdapt<'a, I> {
    registry: &'a mut ClassRegistry,
    objects: I,
    to: ClassId,
    allow_implicit: bool,
    interface_only: Option<bool>,
}

impl<I> Iterator for FilterAdapt<'_, I>
where
    I: Iterator<Item = Object>,
{
    type Item = Result<Object, InterfaceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let obj = self.objects.next()?;
            match self.registry.adapt_or_none(
                self.to,
                &obj,
                self.allow_implicit,
                self.interface_only,
            ) {
                Ok(Some(adapted)) => return Some(Ok(adapted)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
