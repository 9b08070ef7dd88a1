use std::{path::PathBuf, sync::Arc};

use thiserror::Error;

use crate::types::DynError;

/// Errors while registering or resolving a binding
///
/// All of them are recovered locally: they fail a single registration,
/// resolution or unit and are reported to the notification sinks.
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// A binding needs a name
    #[error("Binding name must not be empty")]
    EmptyName,
    /// The name is already registered
    #[error("A binding named '{0}' is already registered")]
    NameCollision(String),
    /// The name is owned by the external module resolver
    #[error("'{0}' is an external module and can't be registered")]
    ReservedExternalName(String),
    /// Neither registered nor external
    #[error("Module '{0}' not found")]
    NotFound(String),
    /// The name appeared twice on one resolution path
    #[error("Circular dependency on '{name}' through {}", render_cycle(.name, .path))]
    Circular { name: String, path: Vec<String> },
    /// A unit does not export what it has to
    #[error("Invalid unit '{name}': {reason}")]
    InvalidUnit { name: String, reason: String },
    /// The entry point of a binding failed
    #[error("Instantiation of '{name}' failed - error: {error}")]
    InstantiationFailure { name: String, error: Arc<DynError> },
    /// The external resolver claimed the name but could not load it
    #[error("External module '{name}' failed to load - error: {error}")]
    ExternalLoadFailed { name: String, error: Arc<DynError> },
    /// The unit loader could not produce the unit behind a locator
    #[error("Unit '{locator}' failed to load - error: {error}")]
    UnitLoadFailed { locator: String, error: Arc<DynError> },
}

impl DiError {
    /// Path of the resolution chain, only set for circular dependencies
    pub fn cycle(&self) -> Option<&[String]> {
        match self {
            DiError::Circular { path, .. } => Some(path),
            _ => None,
        }
    }
}

fn render_cycle(name: &str, path: &[String]) -> String {
    let mut chain: Vec<&str> = path.iter().map(String::as_str).collect();
    chain.push(name);
    chain.join(" -> ")
}

/// Errors when reading positional arguments inside an entry point
#[derive(Error, Debug, Clone)]
pub enum ArgError {
    #[error("No argument at position {index}")]
    Missing { index: usize },
    #[error("No argument named '{0}'")]
    UnknownName(String),
    #[error("Argument {index} is '{actual}', required: '{required}'")]
    Downcast {
        index: usize,
        required: &'static str,
        actual: &'static str,
    },
}

/// Errors while walking a discovery root
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Failed to scan '{root}': {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Errors ending the load loop
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// The fallback asked to stop after a unit failed
    #[error("Loading aborted at '{path}': {source}")]
    Aborted {
        path: PathBuf,
        #[source]
        source: DiError,
    },
}
