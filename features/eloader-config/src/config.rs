use std::path::PathBuf;

use eloader_di::{
    AbortOnError, Container, ContinueOnError, DiError, Directory, Fallback, RootKind,
};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Name the configuration is bound to in a container
pub const CONFIG_BINDING: &str = "config";

/// Configuration of a load run
///
/// # Example
/// ```toml
/// fail_fast = true
/// extensions = ["rs"]
///
/// [[roots]]
/// path = "services"
/// role = "service"
/// recursive = true
///
/// [[roots]]
/// path = "routes"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directories searched for units, in load order
    pub roots: Vec<RootConfig>,
    /// File extensions of units, without the dot
    pub extensions: Vec<String>,
    /// Stop at the first failing unit
    pub fail_fast: bool,
    /// Default log filter when `RUST_LOG` is not set
    pub log_level: String,
}
impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            extensions: vec![eloader_di::discovery::DEFAULT_EXTENSION.to_string()],
            fail_fast: false,
            log_level: "info".to_string(),
        }
    }
}

/// One discovery root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub role: RootRole,
}

/// What the units below a root are used for
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootRole {
    #[default]
    Route,
    Service,
}
impl From<RootRole> for RootKind {
    fn from(role: RootRole) -> Self {
        match role {
            RootRole::Route => RootKind::Route,
            RootRole::Service => RootKind::Service,
        }
    }
}

impl LoaderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(index) = self
            .roots
            .iter()
            .position(|root| root.path.as_os_str().is_empty())
        {
            return Err(ConfigError::EmptyRoot(index));
        }
        if self.extensions.iter().all(|extension| extension.trim().is_empty()) {
            return Err(ConfigError::NoExtensions);
        }
        Ok(())
    }

    /// The configured roots, ready for discovery
    pub fn directories(&self) -> Vec<Directory> {
        self.roots
            .iter()
            .map(|root| {
                Directory::new(&root.path, root.recursive, root.role.into())
                    .with_extensions(&self.extensions)
            })
            .collect()
    }

    /// Fallback matching `fail_fast`
    pub fn fallback(&self) -> Box<dyn Fallback> {
        if self.fail_fast {
            Box::new(AbortOnError)
        } else {
            Box::new(ContinueOnError)
        }
    }

    /// Makes the configuration injectable as [`CONFIG_BINDING`]
    pub fn register_into(&self, container: &mut Container) -> Result<(), DiError> {
        container.register(CONFIG_BINDING, self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = LoaderConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.extensions, vec!["rs"]);
        assert!(!config.fail_fast);
    }

    #[test]
    fn rejects_empty_roots_and_extensions() {
        let config = LoaderConfig {
            roots: vec![RootConfig {
                path: PathBuf::new(),
                recursive: false,
                role: RootRole::Route,
            }],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyRoot(0))));

        let config = LoaderConfig {
            extensions: vec![],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoExtensions)));
    }

    #[test]
    fn roots_become_directories() {
        let config = LoaderConfig {
            roots: vec![RootConfig {
                path: PathBuf::from("services"),
                recursive: true,
                role: RootRole::Service,
            }],
            ..Default::default()
        };

        let directories = config.directories();

        assert_eq!(directories.len(), 1);
        assert_eq!(directories[0].kind(), RootKind::Service);
        assert!(directories[0].is_recursive());
    }

    #[test]
    fn config_is_injectable() {
        let config = LoaderConfig {
            fail_fast: true,
            ..Default::default()
        };
        let mut container = Container::default();

        config.register_into(&mut container).unwrap();

        let injected = container.get(CONFIG_BINDING).unwrap();
        assert!(injected.downcast::<LoaderConfig>().unwrap().fail_fast);
    }
}
