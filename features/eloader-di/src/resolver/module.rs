use std::sync::Arc;

use crate::{
    binding::{Binding, BindingValue},
    container::Container,
    errors::DiError,
    factories::{EntryPoint, Export},
};

impl Container {
    /// Loads the unit behind a module binding and rebinds it by its export
    ///
    /// Bindings which are no longer plain modules are left alone.
    pub(crate) fn load_module(&mut self, name: &str) -> Result<(), DiError> {
        let Some(binding) = self.registry.lookup(name) else {
            return Err(self.fail(DiError::NotFound(name.to_string()), None));
        };
        let BindingValue::Source(source) = &binding.value else {
            return Ok(());
        };
        let source = source.clone();
        let origin = binding.origin.clone();

        let unit = self.loader.load(&source.locator).map_err(|error| {
            self.fail(
                DiError::UnitLoadFailed {
                    locator: source.locator.clone(),
                    error: Arc::new(error),
                },
                origin.as_deref(),
            )
        })?;

        let mismatch = match (&unit.export, source.is_class) {
            (Export::Empty, _) => Some("the unit exports nothing"),
            (Export::Value(_), true) => Some("expected a constructor, the unit exports a value"),
            (Export::Entry(EntryPoint::Procedure(_)), true) => {
                Some("expected a constructor, the unit exports a procedure")
            }
            _ => None,
        };
        if let Some(reason) = mismatch {
            return Err(self.fail(
                DiError::InvalidUnit {
                    name: name.to_string(),
                    reason: reason.to_string(),
                },
                origin.as_deref(),
            ));
        }

        let Ok(mut loaded) = Binding::unit(name, unit) else {
            return Err(self.fail(
                DiError::InvalidUnit {
                    name: name.to_string(),
                    reason: "the unit exports nothing".to_string(),
                },
                origin.as_deref(),
            ));
        };
        loaded.origin = origin;
        tracing::debug!(
            "Loaded module '{name}' from '{}' as {:?}",
            source.locator,
            loaded.kind
        );

        if let Some(binding) = self.registry.lookup_mut(name) {
            *binding = loaded;
        }
        Ok(())
    }
}
