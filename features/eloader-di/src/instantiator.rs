use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use crate::{
    errors::DiError,
    factories::{Args, EntryPoint},
    types::{DynError, Instance},
};

/// Invokes an entry point with its resolved arguments
///
/// Constructors yield the constructed instance, procedures yield `true`.
/// Errors and panics raised by the entry point are caught and turned into
/// [`DiError::InstantiationFailure`].
pub fn instantiate(name: &str, entry: EntryPoint, args: Args) -> Result<Instance, DiError> {
    let is_constructor = entry.is_constructor();
    tracing::debug!(
        "Invoking {} of '{name}' with {} arguments",
        if is_constructor { "constructor" } else { "procedure" },
        args.len()
    );

    let outcome = catch_unwind(AssertUnwindSafe(move || match entry {
        EntryPoint::Constructor(construct) => construct(args),
        EntryPoint::Procedure(procedure) => procedure(args).map(|()| Instance::new(true)),
    }));

    let error = match outcome {
        Ok(Ok(instance)) => {
            tracing::debug!("Instantiated '{name}' as {}", instance.info);
            return Ok(instance);
        }
        Ok(Err(error)) => error,
        Err(panic) => panic_message(panic),
    };

    Err(DiError::InstantiationFailure {
        name: name.to_string(),
        error: Arc::new(error),
    })
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> DynError {
    let message = match panic.downcast::<String>() {
        Ok(message) => *message,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(message) => message.to_string(),
            Err(_) => "unknown panic".to_string(),
        },
    };
    format!("panicked: {message}").into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: Vec<Instance>) -> Args {
        let names = (0..values.len()).map(|i| format!("arg{i}")).collect();
        Args::new(names, values)
    }

    #[test]
    fn constructor_applies_arguments_positionally() {
        let entry = EntryPoint::constructor(|args: Args| {
            let a = args.get::<u32>(0)?;
            let b = args.get::<u32>(1)?;
            Ok::<_, DynError>(*a * 10 + *b)
        });

        let instance = instantiate("sum", entry, args(vec![Instance::new(4_u32), Instance::new(2_u32)]))
            .unwrap();

        assert_eq!(*instance.downcast::<u32>().unwrap(), 42);
    }

    #[test]
    fn procedure_signals_success() {
        let entry = EntryPoint::procedure(|_| Ok::<_, DynError>(()));

        let instance = instantiate("job", entry, args(vec![])).unwrap();

        assert!(*instance.downcast::<bool>().unwrap());
    }

    #[test]
    fn errors_and_panics_become_failures() {
        let failing = EntryPoint::procedure(|_| Err::<(), _>("boom"));
        let panicking = EntryPoint::constructor(|_| -> Result<u8, DynError> { panic!("kaboom") });

        let failed = instantiate("failing", failing, args(vec![])).unwrap_err();
        let panicked = instantiate("panicking", panicking, args(vec![])).unwrap_err();

        assert!(failed.to_string().contains("boom"));
        assert!(matches!(panicked, DiError::InstantiationFailure { ref name, .. } if name == "panicking"));
        assert!(panicked.to_string().contains("kaboom"));
    }
}
