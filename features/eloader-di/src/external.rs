use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use crate::types::{DynError, Injectable, Instance};

/// Resolves names outside of the registry
///
/// External modules take precedence over registered bindings and their
/// names can't be registered. Asking [`ExternalResolver::can_resolve`] must be
/// cheap and free of side effects; loading happens in
/// [`ExternalResolver::load`].
pub trait ExternalResolver {
    fn can_resolve(&self, name: &str) -> bool;

    fn load(&self, name: &str) -> Result<Instance, DynError>;
}

/// No external modules at all
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExternal;
impl ExternalResolver for NoExternal {
    fn can_resolve(&self, _name: &str) -> bool {
        false
    }

    fn load(&self, name: &str) -> Result<Instance, DynError> {
        Err(format!("'{name}' is not an external module").into())
    }
}

type ModuleLoader = Box<dyn Fn() -> Result<Instance, DynError> + Send + Sync>;

struct ExternalModule {
    loader: ModuleLoader,
    loaded: OnceLock<Instance>,
}

/// Catalog of named external modules
///
/// Every module is loaded on first request and cached, so repeated loads
/// hand out the same instance.
#[derive(Default)]
pub struct ExternalModules {
    modules: HashMap<String, ExternalModule>,
}
impl std::fmt::Debug for ExternalModules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.modules.keys()).finish()
    }
}

impl ExternalModules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module built on first load
    pub fn add<F>(mut self, name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Result<Instance, DynError> + Send + Sync + 'static,
    {
        self.modules.insert(
            name.into(),
            ExternalModule {
                loader: Box::new(loader),
                loaded: OnceLock::new(),
            },
        );
        self
    }

    /// Adds an already built module
    pub fn add_value<T: Injectable>(self, name: impl Into<String>, value: T) -> Self {
        let value = Arc::new(value);
        self.add(name, move || Ok(Instance::from_arc(value.clone())))
    }
}

impl ExternalResolver for ExternalModules {
    fn can_resolve(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    fn load(&self, name: &str) -> Result<Instance, DynError> {
        let module = self
            .modules
            .get(name)
            .ok_or_else(|| DynError::from(format!("'{name}' is not an external module")))?;

        if let Some(loaded) = module.loaded.get() {
            return Ok(loaded.clone());
        }

        let instance = (module.loader)()?;
        tracing::debug!("Loaded external module '{name}'");
        Ok(module.loaded.get_or_init(|| instance).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_are_cached() {
        let modules = ExternalModules::new().add("fs", || Ok(Instance::new(String::from("fs"))));

        let first = modules.load("fs").unwrap();
        let second = modules.load("fs").unwrap();

        assert!(modules.can_resolve("fs"));
        assert!(first.ptr_eq(&second));
    }

    #[test]
    fn unknown_modules_are_not_resolvable() {
        let modules = ExternalModules::new();

        assert!(!modules.can_resolve("path"));
        assert!(modules.load("path").is_err());
        assert!(!NoExternal.can_resolve("fs"));
    }
}
