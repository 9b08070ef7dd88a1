use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    binding::Binding,
    container::Container,
    discovery::{Discovery, RootKind, UnitDescriptor},
    errors::{DiError, LoadError},
    events::{Event, Severity},
    factories::Unit,
    types::DynError,
};

/// Turns a locator (file path or identifier) into a unit
pub trait UnitLoader {
    fn load(&self, locator: &str) -> Result<Unit, DynError>;
}

/// Knows no units at all
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUnits;
impl UnitLoader for NoUnits {
    fn load(&self, locator: &str) -> Result<Unit, DynError> {
        Err(format!("No unit known for '{locator}'").into())
    }
}

type UnitFn = Box<dyn Fn() -> Unit + Send + Sync>;

/// Units compiled into the host, looked up by locator
///
/// A locator matches a key either verbatim or through its file stem, so a
/// discovered `routes/users.rs` is served by the unit registered as `users`.
#[derive(Default)]
pub struct UnitCatalog {
    units: HashMap<String, UnitFn>,
}
impl std::fmt::Debug for UnitCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.units.keys()).finish()
    }
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(mut self, key: impl Into<String>, unit: F) -> Self
    where
        F: Fn() -> Unit + Send + Sync + 'static,
    {
        self.units.insert(key.into(), Box::new(unit));
        self
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.find(locator).is_some()
    }

    fn find(&self, locator: &str) -> Option<&UnitFn> {
        self.units.get(locator).or_else(|| {
            let stem = Path::new(locator).file_stem()?.to_str()?;
            self.units.get(stem)
        })
    }
}

impl UnitLoader for UnitCatalog {
    fn load(&self, locator: &str) -> Result<Unit, DynError> {
        match self.find(locator) {
            Some(unit) => Ok(unit()),
            None => Err(format!("No unit known for '{locator}'").into()),
        }
    }
}

/// What to do after a unit failed to load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Go on with the next unit
    Continue,
    /// Stop loading, the run ends with [`LoadError::Aborted`]
    Abort,
}

/// Decides how the load loop reacts to a failing unit
///
/// The failure itself has already been reported when this is called.
pub trait Fallback {
    fn on_unit_error(&mut self, path: &Path, error: &DiError) -> Escalation;
}

impl<F: FnMut(&Path, &DiError) -> Escalation> Fallback for F {
    fn on_unit_error(&mut self, path: &Path, error: &DiError) -> Escalation {
        self(path, error)
    }
}

/// Keeps loading past failures
#[derive(Debug, Default, Clone, Copy)]
pub struct ContinueOnError;
impl Fallback for ContinueOnError {
    fn on_unit_error(&mut self, _path: &Path, _error: &DiError) -> Escalation {
        Escalation::Continue
    }
}

/// Stops at the first failure
#[derive(Debug, Default, Clone, Copy)]
pub struct AbortOnError;
impl Fallback for AbortOnError {
    fn on_unit_error(&mut self, _path: &Path, _error: &DiError) -> Escalation {
        Escalation::Abort
    }
}

/// Outcome of a completed load loop
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Service units registered as bindings
    pub registered: usize,
    /// Route units whose entry point ran successfully
    pub invoked: usize,
    /// Units which failed and were skipped
    pub failed: Vec<PathBuf>,
}

impl Container {
    /// Discovers units and loads them
    ///
    /// All service units are registered first, by file stem, so routes can
    /// depend on any of them. Route units are then loaded and invoked in
    /// discovery order. Roots which do not exist are reported as warnings.
    pub fn run(
        &mut self,
        discovery: &dyn Discovery,
        fallback: &mut dyn Fallback,
    ) -> Result<RunReport, LoadError> {
        for root in discovery.missing_roots() {
            self.notify(
                Event::warn(format!("'{}' is not a directory, skipping", root.display()))
                    .with_origin(Some(root)),
            );
        }
        let units = discovery.discover().map_err(|error| {
            self.notify(Event::new(Severity::Error, error.to_string()));
            error
        })?;
        let (services, routes): (Vec<UnitDescriptor>, Vec<UnitDescriptor>) = units
            .into_iter()
            .partition(|unit| unit.kind == RootKind::Service);

        tracing::debug!(
            "Loading {} service units and {} route units",
            services.len(),
            routes.len()
        );

        let mut report = RunReport::default();
        for unit in services {
            let result = self.register_service(&unit);
            if settle(&unit.path, result, fallback, &mut report)? {
                report.registered += 1;
            }
        }
        for unit in routes {
            let result = self.invoke_route(&unit);
            if settle(&unit.path, result, fallback, &mut report)? {
                report.invoked += 1;
            }
        }

        self.notify(Event::info(format!(
            "Loaded {} services and {} routes, {} failed",
            report.registered,
            report.invoked,
            report.failed.len()
        )));
        Ok(report)
    }

    fn register_service(&mut self, unit: &UnitDescriptor) -> Result<(), DiError> {
        let name = self.unit_name(unit)?;
        let locator = unit.path.to_string_lossy();
        self.register_binding(Binding::module(name, locator, false).with_origin(&unit.path))
    }

    fn invoke_route(&mut self, unit: &UnitDescriptor) -> Result<(), DiError> {
        let name = self.unit_name(unit)?;
        let locator = unit.path.to_string_lossy();
        let loaded = self.loader.load(&locator).map_err(|error| {
            self.fail(
                DiError::UnitLoadFailed {
                    locator: locator.to_string(),
                    error: Arc::new(error),
                },
                Some(&unit.path),
            )
        })?;

        self.try_invoke_entry_point(&name, loaded, Some(&unit.path))
            .map(|_| ())
    }

    fn unit_name(&self, unit: &UnitDescriptor) -> Result<String, DiError> {
        match unit.name() {
            Some(name) => Ok(name.to_string()),
            None => Err(self.fail(
                DiError::InvalidUnit {
                    name: unit.path.display().to_string(),
                    reason: "the file name is not a valid binding name".to_string(),
                },
                Some(&unit.path),
            )),
        }
    }
}

/// Hands a failed unit to the fallback
///
/// Returns whether the unit succeeded; failed units are recorded in the
/// report unless the fallback aborts the run.
fn settle(
    path: &Path,
    result: Result<(), DiError>,
    fallback: &mut dyn Fallback,
    report: &mut RunReport,
) -> Result<bool, LoadError> {
    let Err(error) = result else {
        return Ok(true);
    };

    report.failed.push(path.to_path_buf());
    match fallback.on_unit_error(path, &error) {
        Escalation::Continue => Ok(false),
        Escalation::Abort => Err(LoadError::Aborted {
            path: path.to_path_buf(),
            source: error,
        }),
    }
}
