use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::{container::Container, external::ExternalResolver, registry::Registry};

/// Static view of the registered bindings and what they depend on
///
/// Used to find missing and circular dependencies before anything is
/// resolved. Module bindings which have not been loaded yet have unknown
/// dependencies and are not traversed.
#[derive(Debug)]
pub struct DependencyGraph {
    map: BTreeMap<String, DependencyGraphEntry>,
}

#[derive(Debug)]
struct DependencyGraphEntry {
    name: String,
    /// None = not known until the module is loaded
    dependencies: Option<Vec<String>>,
}

impl DependencyGraph {
    pub fn new(registry: &Registry, external: &dyn ExternalResolver) -> Self {
        let mut map = BTreeMap::new();
        for binding in registry.bindings() {
            let dependencies = binding.dependencies().map(|dependencies| {
                dependencies
                    .into_iter()
                    .filter(|dependency| !external.can_resolve(dependency))
                    .collect()
            });
            map.insert(
                binding.name().to_string(),
                DependencyGraphEntry {
                    name: binding.name().to_string(),
                    dependencies,
                },
            );
        }

        Self { map }
    }

    /// Dependencies of `name`, if they are known
    pub fn dependencies(&self, name: &str) -> Option<&[String]> {
        self.map.get(name)?.dependencies.as_deref()
    }

    /// Validate the graph
    ///
    /// Returns a list of all issues
    pub fn check(&self) -> Result<(), DependencyGraphErrors> {
        let mut checked = HashSet::new();
        let mut errors = Vec::new();
        for entry in self.map.values() {
            let mut dependency_chain = Vec::new();
            check_recurse(self, &mut checked, &mut errors, &mut dependency_chain, entry);
        }

        if !errors.is_empty() {
            return Err(DependencyGraphErrors { errors });
        }

        return Ok(());

        fn check_recurse<'a>(
            graph: &'a DependencyGraph,
            checked: &mut HashSet<&'a str>,
            errors: &mut Vec<DependencyGraphError>,
            dependency_chain: &mut Vec<&'a str>,
            entry: &'a DependencyGraphEntry,
        ) {
            // Circular Dependency Check
            if let Some(start) = dependency_chain.iter().position(|name| *name == entry.name) {
                let mut chain: Vec<String> = dependency_chain[start..]
                    .iter()
                    .map(|name| name.to_string())
                    .collect();
                chain.push(entry.name.clone());

                errors.push(DependencyGraphError::CircularDependency { chain });
                return;
            }

            // Skip other checks if already checked
            if !checked.insert(entry.name.as_str()) {
                return;
            }

            let Some(dependencies) = &entry.dependencies else {
                return;
            };

            dependency_chain.push(&entry.name);

            for dependency in dependencies {
                let Some(next_entry) = graph.map.get(dependency) else {
                    errors.push(DependencyGraphError::MissingDependency {
                        dependency: dependency.clone(),
                        required_by: entry.name.clone(),
                    });
                    continue;
                };

                check_recurse(graph, checked, errors, dependency_chain, next_entry);
            }

            dependency_chain.pop();
        }
    }
}

impl Container {
    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::new(&self.registry, self.external.as_ref())
    }

    /// Checks the whole graph without resolving anything
    pub fn validate(&self) -> Result<(), DependencyGraphErrors> {
        self.graph().check()
    }
}

#[derive(Error, Debug, Clone)]
pub enum DependencyGraphError {
    #[error("'{required_by}' needs '{dependency}' but it is missing")]
    MissingDependency {
        dependency: String,
        required_by: String,
    },
    #[error("A Circular Dependency exists through {}", .chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },
}
impl std::fmt::Display for DependencyGraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

#[derive(Error, Debug, Clone)]
pub struct DependencyGraphErrors {
    pub errors: Vec<DependencyGraphError>,
}
