use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::{config::LoaderConfig, errors::ConfigError};

/// Prefix of environment overrides, `ELOADER_FAIL_FAST=true`
pub const ENV_PREFIX: &str = "ELOADER";

/// Loads a [`LoaderConfig`] from its sources
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}
impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Load the configuration, later sources override earlier ones:
    /// 1. [`LoaderConfig::default`]
    /// 2. The TOML file, if one was given and it exists
    /// 3. Prefixed environment variables, nested keys separated by `__`
    pub fn load(&self) -> Result<LoaderConfig, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(LoaderConfig::default()));

        if let Some(config_path) = &self.config_path {
            if config_path.exists() {
                tracing::debug!("Loading configuration from {}", config_path.display());
                figment = figment.merge(Toml::file(config_path));
            } else {
                tracing::warn!(
                    "Configuration file {} not found, using defaults",
                    config_path.display()
                );
            }
        }

        figment = figment.merge(Env::prefixed(&format!("{}_", self.env_prefix)).split("__"));

        let config: LoaderConfig = figment.extract()?;
        config.validate()?;

        tracing::debug!(
            "Loaded configuration with {} roots, fail fast: {}",
            config.roots.len(),
            config.fail_fast
        );
        Ok(config)
    }
}
