//! Name based dependency injection for loadable units.
//!
//! A [`Container`] owns a [`registry::Registry`] of named bindings: plain
//! values, units loaded on first use, and entry points which are invoked
//! (procedures) or constructed (class factories) at most once. Resolving a
//! name with [`Container::get`] builds its whole dependency graph, detects
//! circular dependencies on the way and memoizes every built binding.
//!
//! The container consists of the following parts:
//!
//! 1. Bindings and the registry - what is known, by name
//! 2. Manifest - which names an entry point depends on
//! 3. Instantiator - invoking an entry point with its resolved dependencies
//! 4. Resolver - `get`, with cycle detection along the resolution path
//! 5. Collaborators - external modules, unit loading, discovery and
//!    notification sinks
//!
//! ```rust
//! use eloader_di::{Container, Unit, DynError};
//!
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! let mut container = Container::default();
//! container.register("greeting", String::from("hello")).unwrap();
//! container
//!     .register_unit(
//!         "greeter",
//!         Unit::constructor(|args| {
//!             let greeting = args.get::<String>(0)?;
//!             Ok::<_, DynError>(Greeter { greeting: greeting.to_string() })
//!         })
//!         .inject(["greeting"]),
//!     )
//!     .unwrap();
//!
//! let greeter = container.get("greeter").unwrap();
//! assert_eq!(greeter.downcast::<Greeter>().unwrap().greeting, "hello");
//! ```

pub mod binding;
pub mod builder;
pub mod container;
pub mod discovery;
pub mod errors;
pub mod events;
pub mod external;
pub mod factories;
pub mod graph;
pub mod instantiator;
pub mod loader;
pub mod manifest;
pub mod registry;
pub mod resolver;
pub mod types;

pub use binding::{Binding, BindingKind, Resolution};
pub use builder::ContainerBuilder;
pub use container::Container;
pub use discovery::{Directory, Discovery, RootKind, UnitDescriptor};
pub use errors::{ArgError, DiError, DiscoveryError, LoadError};
pub use events::{ChannelSink, Event, EventStream, NotificationSink, Severity, TracingSink};
pub use external::{ExternalModules, ExternalResolver, NoExternal};
pub use factories::{Args, EntryPoint, Export, Unit};
pub use graph::{DependencyGraph, DependencyGraphError, DependencyGraphErrors};
pub use loader::{
    AbortOnError, ContinueOnError, Escalation, Fallback, NoUnits, RunReport, UnitCatalog,
    UnitLoader,
};
pub use manifest::Manifest;
pub use resolver::ResolutionPath;
pub use types::{DynError, Injectable, Instance, TypeInfo};
