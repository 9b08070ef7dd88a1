use crate::{
    binding::Binding,
    container::Container,
    events::{NotificationSink, TracingSink},
    external::{ExternalResolver, NoExternal},
    factories::Unit,
    loader::{NoUnits, UnitLoader},
    registry::Registry,
    types::{Injectable, Instance},
};

/// Registrations queued until [`ContainerBuilder::build`]
enum Registration {
    Binding(Binding),
    Unit(String, Unit),
}

/// Collects collaborators and registrations for a [`Container`]
///
/// Registrations are applied in insertion order when the container is
/// built. Rejected ones are reported to the sinks and skipped.
pub struct ContainerBuilder {
    external: Box<dyn ExternalResolver>,
    loader: Box<dyn UnitLoader>,
    sinks: Vec<Box<dyn NotificationSink>>,
    registrations: Vec<Registration>,
}
impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        ContainerBuilder {
            external: Box::new(NoExternal),
            loader: Box::new(NoUnits),
            sinks: Vec::new(),
            registrations: Vec::new(),
        }
    }
}
impl ContainerBuilder {
    pub fn external(mut self, external: impl ExternalResolver + 'static) -> Self {
        self.external = Box::new(external);
        self
    }

    pub fn loader(mut self, loader: impl UnitLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Adds a notification sink; without any, events go to [`TracingSink`]
    pub fn sink(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn add_instance<T: Injectable>(self, name: impl Into<String>, instance: T) -> Self {
        self.add_binding(Binding::value(name, Instance::new(instance)))
    }

    pub fn add_unit(mut self, name: impl Into<String>, unit: Unit) -> Self {
        self.registrations
            .push(Registration::Unit(name.into(), unit));
        self
    }

    pub fn add_module(
        self,
        name: impl Into<String>,
        locator: impl Into<String>,
        is_class: bool,
    ) -> Self {
        self.add_binding(Binding::module(name, locator, is_class))
    }

    pub fn add_binding(mut self, binding: Binding) -> Self {
        self.registrations.push(Registration::Binding(binding));
        self
    }

    pub fn build(self) -> Container {
        let ContainerBuilder {
            external,
            loader,
            mut sinks,
            registrations,
        } = self;

        if sinks.is_empty() {
            sinks.push(Box::new(TracingSink));
        }

        let mut container = Container {
            registry: Registry::new(),
            external,
            loader,
            sinks,
        };

        tracing::debug!(
            "Building container with {} registrations",
            registrations.len()
        );
        for registration in registrations {
            // Failures are reported by the container
            let _ = match registration {
                Registration::Binding(binding) => container.register_binding(binding),
                Registration::Unit(name, unit) => container.register_unit(&name, unit),
            };
        }

        container
    }
}
