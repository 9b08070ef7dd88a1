//! Eloader Config describes where units are discovered and how failures
//! are escalated, loaded from defaults, a TOML file and the environment.
//!
//! Eloader Config is split into two major parts:
//! 1. LoaderConfig: The configuration itself, convertible into discovery
//!    roots and a fallback
//! 2. ConfigLoader: Merges the configuration sources
//!
//! # Examples
//!
//! ```rust
//! use eloader_config::{ConfigLoader, LoaderConfig};
//! use eloader_di::Container;
//!
//! fn setup() -> Result<Container, Box<dyn std::error::Error>> {
//!     let config: LoaderConfig = ConfigLoader::new()
//!         .with_config_path("eloader.toml")
//!         .load()?;
//!
//!     let mut container = Container::default();
//!     config.register_into(&mut container)?;
//!     container.run(&config.directories(), config.fallback().as_mut())?;
//!     Ok(container)
//! }
//! ```
//!
//! Eloader Config consists of the following components:
//!
//! 1. Config - the configuration and its validation
//! 2. Provider - for loading the configuration
//! 3. Errors - for config errors

pub mod config;
pub mod errors;
pub mod provider;

pub use config::{LoaderConfig, RootConfig, RootRole, CONFIG_BINDING};
pub use errors::ConfigError;
pub use provider::{ConfigLoader, ENV_PREFIX};
