use std::{fmt::Debug, path::PathBuf};

use crate::{
    factories::{EntryPoint, Export, Unit},
    types::Instance,
};

/// How a binding produces its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Already built, returned as-is
    Value,
    /// Backed by a unit which is loaded on first use
    Module,
    /// Entry point invoked once for its side effect
    Factory,
    /// Entry point constructing the bound instance once
    ClassFactory,
}

/// Memoization state of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Pending,
    Resolved,
    /// The entry point failed, it is never invoked again
    Failed,
}

/// Locator of an unloaded module binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
    /// File path or identifier handed to the unit loader
    pub locator: String,
    /// The unit must export a constructor
    pub is_class: bool,
}

/// Current payload of a binding
#[derive(Debug)]
pub enum BindingValue {
    Instance(Instance),
    Source(ModuleSource),
    Unit(Unit),
    /// Entry point taken out for invocation and not yet replaced
    Spent,
}

/// A named, registered resolvable unit
#[derive(Debug)]
pub struct Binding {
    pub(crate) name: String,
    pub(crate) kind: BindingKind,
    pub(crate) state: Resolution,
    pub(crate) value: BindingValue,
    pub(crate) origin: Option<PathBuf>,
}

impl Binding {
    pub fn value(name: impl Into<String>, instance: Instance) -> Self {
        Binding {
            name: name.into(),
            kind: BindingKind::Value,
            state: Resolution::Resolved,
            value: BindingValue::Instance(instance),
            origin: None,
        }
    }

    pub fn module(name: impl Into<String>, locator: impl Into<String>, is_class: bool) -> Self {
        Binding {
            name: name.into(),
            kind: BindingKind::Module,
            state: Resolution::Pending,
            value: BindingValue::Source(ModuleSource {
                locator: locator.into(),
                is_class,
            }),
            origin: None,
        }
    }

    /// Binds a unit, its export decides the kind
    ///
    /// Returns the unit back if it exports nothing.
    pub fn unit(name: impl Into<String>, unit: Unit) -> Result<Self, Unit> {
        let name = name.into();
        let kind = match &unit.export {
            Export::Value(_) => Some(BindingKind::Value),
            Export::Entry(EntryPoint::Constructor(_)) => Some(BindingKind::ClassFactory),
            Export::Entry(EntryPoint::Procedure(_)) => Some(BindingKind::Factory),
            Export::Empty => None,
        };
        let Some(kind) = kind else {
            return Err(unit);
        };

        let binding = match unit.export {
            Export::Value(instance) => Binding::value(name, instance),
            export => Binding {
                name,
                kind,
                state: Resolution::Pending,
                value: BindingValue::Unit(Unit { export, ..unit }),
                origin: None,
            },
        };
        Ok(binding)
    }

    pub fn with_origin(mut self, origin: impl Into<PathBuf>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn state(&self) -> Resolution {
        self.state
    }

    pub fn is_resolved(&self) -> bool {
        self.state == Resolution::Resolved
    }

    pub fn origin(&self) -> Option<&PathBuf> {
        self.origin.as_ref()
    }

    /// The stored value, if the binding holds one
    pub fn instance(&self) -> Option<&Instance> {
        match &self.value {
            BindingValue::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Dependency names, as far as they are known without loading anything
    pub fn dependencies(&self) -> Option<Vec<String>> {
        match &self.value {
            BindingValue::Instance(_) => Some(Vec::new()),
            BindingValue::Unit(unit) => Some(unit.dependencies()),
            BindingValue::Source(_) | BindingValue::Spent => None,
        }
    }

    /// Takes the entry point out for its single invocation
    pub(crate) fn take_entry(&mut self) -> Option<EntryPoint> {
        match std::mem::replace(&mut self.value, BindingValue::Spent) {
            BindingValue::Unit(Unit {
                export: Export::Entry(entry),
                ..
            }) => Some(entry),
            other => {
                self.value = other;
                None
            }
        }
    }

    /// Stores the built value
    ///
    /// A constructed instance replaces the class factory, which from now on
    /// behaves like a plain value.
    pub(crate) fn memoize(&mut self, instance: Instance) {
        if self.kind == BindingKind::ClassFactory {
            self.kind = BindingKind::Value;
        }
        self.state = Resolution::Resolved;
        self.value = BindingValue::Instance(instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DynError;

    #[test]
    fn unit_export_decides_the_kind() {
        let constructor =
            Binding::unit("svc", Unit::constructor(|_| Ok::<_, DynError>(1_u8))).unwrap();
        let procedure =
            Binding::unit("job", Unit::procedure(|_| Ok::<_, DynError>(()))).unwrap();
        let value = Binding::unit("cfg", Unit::value(3_u8)).unwrap();

        assert_eq!(constructor.kind(), BindingKind::ClassFactory);
        assert_eq!(procedure.kind(), BindingKind::Factory);
        assert_eq!(value.kind(), BindingKind::Value);
        assert!(value.is_resolved());
        assert!(Binding::unit("nothing", Unit::empty()).is_err());
    }

    #[test]
    fn memoizing_a_class_factory_downgrades_it_to_a_value() {
        let mut binding =
            Binding::unit("svc", Unit::constructor(|_| Ok::<_, DynError>(1_u8))).unwrap();

        binding.memoize(Instance::new(1_u8));

        assert_eq!(binding.kind(), BindingKind::Value);
        assert!(binding.is_resolved());
        assert!(binding.instance().is_some());
    }
}
