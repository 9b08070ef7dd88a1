use std::{any::type_name, fmt::Debug, sync::Arc};

use crate::{
    errors::ArgError,
    manifest::Manifest,
    types::{DynError, Injectable, Instance},
};

type ProcedureFn = Box<dyn FnOnce(Args) -> Result<(), DynError> + Send>;
type ConstructorFn = Box<dyn FnOnce(Args) -> Result<Instance, DynError> + Send>;

/// Callable exported by a unit
///
/// Whether it constructs something or is only run for its side effect is
/// decided when the unit is built, never by looking at the callable.
pub enum EntryPoint {
    /// Invoked for its side effect, resolves to `true`
    Procedure(ProcedureFn),
    /// Produces the instance stored for the binding
    Constructor(ConstructorFn),
}
impl Debug for EntryPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryPoint::Procedure(_) => f.write_str("Procedure"),
            EntryPoint::Constructor(_) => f.write_str("Constructor"),
        }
    }
}

impl EntryPoint {
    pub fn procedure<F, E>(procedure: F) -> Self
    where
        F: FnOnce(Args) -> Result<(), E> + Send + 'static,
        E: Into<DynError>,
    {
        EntryPoint::Procedure(Box::new(move |args| procedure(args).map_err(Into::into)))
    }

    pub fn constructor<T, F, E>(constructor: F) -> Self
    where
        T: Injectable,
        F: FnOnce(Args) -> Result<T, E> + Send + 'static,
        E: Into<DynError>,
    {
        EntryPoint::Constructor(Box::new(move |args| {
            constructor(args).map(Instance::new).map_err(Into::into)
        }))
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self, EntryPoint::Constructor(_))
    }
}

/// What a unit exposes once loaded
#[derive(Debug)]
pub enum Export {
    /// A ready value, bound as-is
    Value(Instance),
    /// A main entry point with dependencies
    Entry(EntryPoint),
    /// Nothing usable
    Empty,
}

/// A loadable unit of work
///
/// The dependency names of the entry point come from the manifest if one is
/// set, else from the optional signature source.
#[derive(Debug)]
pub struct Unit {
    pub manifest: Option<Manifest>,
    pub signature: Option<String>,
    pub export: Export,
}

impl Unit {
    pub fn value<T: Injectable>(value: T) -> Self {
        Unit {
            manifest: None,
            signature: None,
            export: Export::Value(Instance::new(value)),
        }
    }

    pub fn entry(entry: EntryPoint) -> Self {
        Unit {
            manifest: None,
            signature: None,
            export: Export::Entry(entry),
        }
    }

    pub fn procedure<F, E>(procedure: F) -> Self
    where
        F: FnOnce(Args) -> Result<(), E> + Send + 'static,
        E: Into<DynError>,
    {
        Self::entry(EntryPoint::procedure(procedure))
    }

    pub fn constructor<T, F, E>(constructor: F) -> Self
    where
        T: Injectable,
        F: FnOnce(Args) -> Result<T, E> + Send + 'static,
        E: Into<DynError>,
    {
        Self::entry(EntryPoint::constructor(constructor))
    }

    pub fn empty() -> Self {
        Unit {
            manifest: None,
            signature: None,
            export: Export::Empty,
        }
    }

    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Shortcut for a [`Manifest::List`]
    pub fn inject<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_manifest(Manifest::list(names))
    }

    /// Source of the entry point's parameter list, used when no manifest is set
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Ordered dependency names of the entry point
    pub fn dependencies(&self) -> Vec<String> {
        crate::manifest::extract(self.manifest.as_ref(), self.signature.as_deref())
    }
}

/// Resolved dependencies, in manifest order
pub struct Args {
    names: Vec<String>,
    values: Vec<Instance>,
}
impl Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.names.iter().zip(self.values.iter()))
            .finish()
    }
}

impl Args {
    pub(crate) fn new(names: Vec<String>, values: Vec<Instance>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Args { names, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.values.get(index)
    }

    /// Downcasts the argument at `index`
    pub fn get<T: Injectable>(&self, index: usize) -> Result<Arc<T>, ArgError> {
        let instance = self.instance(index).ok_or(ArgError::Missing { index })?;
        instance
            .downcast::<T>()
            .map_err(|actual| ArgError::Downcast {
                index,
                required: type_name::<T>(),
                actual,
            })
    }

    /// Downcasts the argument bound to the dependency `name`
    pub fn named<T: Injectable>(&self, name: &str) -> Result<Arc<T>, ArgError> {
        let index = self
            .names
            .iter()
            .position(|candidate| candidate == name)
            .ok_or_else(|| ArgError::UnknownName(name.to_string()))?;
        self.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args::new(
            vec!["port".into(), "host".into()],
            vec![Instance::new(8080_u16), Instance::new(String::from("localhost"))],
        )
    }

    #[test]
    fn args_are_positional_and_named() {
        let args = args();

        assert_eq!(*args.get::<u16>(0).unwrap(), 8080);
        assert_eq!(args.named::<String>("host").unwrap().as_str(), "localhost");
    }

    #[test]
    fn args_report_bad_access() {
        let args = args();

        assert!(matches!(args.get::<u16>(5), Err(ArgError::Missing { index: 5 })));
        assert!(matches!(
            args.get::<String>(0),
            Err(ArgError::Downcast { index: 0, actual: "u16", .. })
        ));
        assert!(matches!(args.named::<u16>("nope"), Err(ArgError::UnknownName(_))));
    }

    #[test]
    fn unit_dependencies_prefer_the_manifest() {
        let unit = Unit::procedure(|_| Ok::<_, DynError>(()))
            .with_signature("fn main(x: X)")
            .inject(["a", "b"]);

        assert_eq!(unit.dependencies(), vec!["a", "b"]);
    }
}
