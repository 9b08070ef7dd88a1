use std::{fmt::Debug, path::Path};

use crate::{
    binding::Binding,
    builder::ContainerBuilder,
    errors::DiError,
    events::{Event, NotificationSink},
    external::ExternalResolver,
    factories::{Args, Export, Unit},
    instantiator::instantiate,
    loader::UnitLoader,
    registry::Registry,
    resolver::ResolutionPath,
    types::{Injectable, Instance},
};

/// Composition root holding all bindings and the collaborators used to
/// resolve them
///
/// Every failure is reported to the notification sinks once and then
/// handed back to the caller; nothing here panics or aborts the process.
pub struct Container {
    pub(crate) registry: Registry,
    pub(crate) external: Box<dyn ExternalResolver>,
    pub(crate) loader: Box<dyn UnitLoader>,
    pub(crate) sinks: Vec<Box<dyn NotificationSink>>,
}
impl Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("Container");
        for binding in self.registry.bindings() {
            let state = if binding.is_resolved() {
                "resolved"
            } else {
                "pending"
            };
            map.field(binding.name(), &state);
        }
        map.finish()
    }
}
impl Default for Container {
    fn default() -> Self {
        ContainerBuilder::new().build()
    }
}

impl Container {
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Binds an already built value
    pub fn register<T: Injectable>(&mut self, name: &str, value: T) -> Result<(), DiError> {
        self.register_instance(name, Instance::new(value))
    }

    pub fn register_instance(&mut self, name: &str, instance: Instance) -> Result<(), DiError> {
        self.register_binding(Binding::value(name, instance))
    }

    /// Binds a unit which is loaded through the unit loader on first use
    ///
    /// With `is_class` the unit has to export a constructor.
    pub fn register_module(
        &mut self,
        name: &str,
        locator: &str,
        is_class: bool,
    ) -> Result<(), DiError> {
        self.register_binding(Binding::module(name, locator, is_class))
    }

    /// Binds an in-memory unit, its export decides the binding kind
    pub fn register_unit(&mut self, name: &str, unit: Unit) -> Result<(), DiError> {
        match Binding::unit(name, unit) {
            Ok(binding) => self.register_binding(binding),
            Err(_) => Err(self.fail(
                DiError::InvalidUnit {
                    name: name.to_string(),
                    reason: "the unit exports nothing".to_string(),
                },
                None,
            )),
        }
    }

    pub fn register_binding(&mut self, binding: Binding) -> Result<(), DiError> {
        let origin = binding.origin.clone();
        self.registry
            .register(binding, self.external.as_ref())
            .map_err(|error| self.fail(error, origin.as_deref()))
    }

    /// Resolves the dependencies of a unit's entry point and invokes it
    ///
    /// Returns false if the unit has no entry point, a dependency could not
    /// be resolved or the entry point failed.
    pub fn invoke_entry_point(&mut self, unit: Unit) -> bool {
        self.try_invoke_entry_point("main", unit, None).is_ok()
    }

    /// Like [`Container::invoke_entry_point`], returning the produced value
    ///
    /// `name` and `origin` only label the events raised for this unit.
    pub fn try_invoke_entry_point(
        &mut self,
        name: &str,
        unit: Unit,
        origin: Option<&Path>,
    ) -> Result<Instance, DiError> {
        let dependencies = unit.dependencies();
        let Export::Entry(entry) = unit.export else {
            return Err(self.fail(
                DiError::InvalidUnit {
                    name: name.to_string(),
                    reason: "the unit has no main entry point".to_string(),
                },
                origin,
            ));
        };

        let root = ResolutionPath::root();
        let mut values = Vec::with_capacity(dependencies.len());
        for dependency in &dependencies {
            values.push(self.resolve(dependency, &root)?);
        }

        instantiate(name, entry, Args::new(dependencies, values))
            .map_err(|error| self.fail(error, origin))
    }

    /// Reports to all sinks
    pub fn notify(&self, event: Event) {
        for sink in &self.sinks {
            sink.notify(&event);
        }
    }

    /// Reports an error and hands it back
    pub(crate) fn fail(&self, error: DiError, origin: Option<&Path>) -> DiError {
        self.notify(Event::error(error.clone()).with_origin(origin.map(Path::to_path_buf)));
        error
    }
}
