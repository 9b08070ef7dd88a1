use std::sync::Arc;

use crate::{
    binding::{BindingKind, BindingValue, Resolution},
    container::Container,
    errors::DiError,
    factories::Args,
    instantiator::instantiate,
    types::Instance,
};

mod module;
mod path;

pub use path::ResolutionPath;

impl Container {
    /// Resolves `name`, building it and its dependencies on first use
    ///
    /// Returns `None` if anything on the way failed; the failure has then
    /// already been reported to the notification sinks.
    pub fn get(&mut self, name: &str) -> Option<Instance> {
        self.try_get(name).ok()
    }

    /// Like [`Container::get`], returning the error which stopped resolution
    pub fn try_get(&mut self, name: &str) -> Result<Instance, DiError> {
        self.resolve(name, &ResolutionPath::root())
    }

    pub(crate) fn resolve(&mut self, name: &str, path: &ResolutionPath) -> Result<Instance, DiError> {
        // External modules shadow the registry
        if self.external.can_resolve(name) {
            return self.external.load(name).map_err(|error| {
                self.fail(
                    DiError::ExternalLoadFailed {
                        name: name.to_string(),
                        error: Arc::new(error),
                    },
                    None,
                )
            });
        }

        let Some(binding) = self.registry.lookup(name) else {
            return Err(self.fail(DiError::NotFound(name.to_string()), None));
        };
        if binding.kind == BindingKind::Module {
            self.load_module(name)?;
        }

        let Some(binding) = self.registry.lookup(name) else {
            return Err(self.fail(DiError::NotFound(name.to_string()), None));
        };
        match binding.state {
            Resolution::Resolved => {
                if let BindingValue::Instance(instance) = &binding.value {
                    return Ok(instance.clone());
                }
            }
            Resolution::Failed => {
                let origin = binding.origin.clone();
                return Err(self.fail(
                    DiError::InstantiationFailure {
                        name: name.to_string(),
                        error: Arc::new("the entry point failed on an earlier resolution".into()),
                    },
                    origin.as_deref(),
                ));
            }
            Resolution::Pending => {}
        }

        self.build(name, path)
    }

    /// Builds a pending factory or class factory binding
    fn build(&mut self, name: &str, path: &ResolutionPath) -> Result<Instance, DiError> {
        let Some(binding) = self.registry.lookup(name) else {
            return Err(self.fail(DiError::NotFound(name.to_string()), None));
        };
        let origin = binding.origin.clone();

        if path.contains(name) {
            return Err(self.fail(
                DiError::Circular {
                    name: name.to_string(),
                    path: path.names().to_vec(),
                },
                origin.as_deref(),
            ));
        }
        let path = path.extended(name);

        let dependencies = binding.dependencies().unwrap_or_default();
        tracing::debug!("Resolving '{path}' with dependencies {dependencies:?}");

        // First failing dependency aborts, nothing gets constructed
        let mut values = Vec::with_capacity(dependencies.len());
        for dependency in &dependencies {
            values.push(self.resolve(dependency, &path)?);
        }

        let entry = self
            .registry
            .lookup_mut(name)
            .and_then(|binding| binding.take_entry());
        let Some(entry) = entry else {
            return Err(self.fail(
                DiError::InvalidUnit {
                    name: name.to_string(),
                    reason: "the entry point is no longer available".to_string(),
                },
                origin.as_deref(),
            ));
        };

        let result = instantiate(name, entry, Args::new(dependencies, values));
        let Some(binding) = self.registry.lookup_mut(name) else {
            return Err(self.fail(DiError::NotFound(name.to_string()), origin.as_deref()));
        };
        match result {
            Ok(instance) => {
                binding.memoize(instance.clone());
                tracing::debug!("Memoized '{name}'");
                Ok(instance)
            }
            Err(error) => {
                binding.state = Resolution::Failed;
                Err(self.fail(error, origin.as_deref()))
            }
        }
    }
}
