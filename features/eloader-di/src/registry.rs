use std::collections::BTreeMap;

use crate::{binding::Binding, errors::DiError, external::ExternalResolver};

/// All bindings known to a container, by name
#[derive(Debug, Default)]
pub struct Registry {
    bindings: BTreeMap<String, Binding>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new binding
    ///
    /// Rejects, in this order: empty names, names the external resolver
    /// owns and names already registered. An existing binding is never
    /// replaced.
    pub fn register(
        &mut self,
        binding: Binding,
        external: &dyn ExternalResolver,
    ) -> Result<(), DiError> {
        if binding.name.is_empty() {
            return Err(DiError::EmptyName);
        }
        if external.can_resolve(&binding.name) {
            return Err(DiError::ReservedExternalName(binding.name));
        }
        if self.contains(&binding.name) {
            return Err(DiError::NameCollision(binding.name));
        }

        tracing::debug!("Registered '{}' as {:?}", binding.name, binding.kind);
        self.bindings.insert(binding.name.clone(), binding);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub(crate) fn lookup_mut(&mut self, name: &str) -> Option<&mut Binding> {
        self.bindings.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Drops every binding
    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        binding::BindingKind,
        external::{ExternalModules, NoExternal},
        types::Instance,
    };

    #[test]
    fn collisions_keep_the_first_binding() {
        let mut registry = Registry::new();
        registry
            .register(Binding::value("svc", Instance::new(1_u8)), &NoExternal)
            .unwrap();

        let result = registry.register(Binding::module("svc", "svc.rs", false), &NoExternal);

        assert!(matches!(result, Err(DiError::NameCollision(ref name)) if name == "svc"));
        let kept = registry.lookup("svc").unwrap();
        assert_eq!(kept.kind(), BindingKind::Value);
        assert_eq!(*kept.instance().unwrap().downcast::<u8>().unwrap(), 1);
    }

    #[test]
    fn checks_run_in_order() {
        let external = ExternalModules::new().add_value("fs", 0_u8);
        let mut registry = Registry::new();

        let empty = registry.register(Binding::value("", Instance::new(0_u8)), &external);
        let reserved = registry.register(Binding::value("fs", Instance::new(0_u8)), &external);

        assert!(matches!(empty, Err(DiError::EmptyName)));
        assert!(matches!(reserved, Err(DiError::ReservedExternalName(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = Registry::new();
        for name in ["b", "c", "a"] {
            registry
                .register(Binding::value(name, Instance::new(())), &NoExternal)
                .unwrap();
        }

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);

        registry.clear();
        assert_eq!(registry.len(), 0);
    }
}
