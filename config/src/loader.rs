//! Configuration loading utilities
//!
//! Locates the kernelng configuration file and parses it into a [`Config`].

use crate::constants::Constants;
use crate::{Config, ConfigError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loader for the kernelng configuration file
pub struct ConfigLoader {
    /// Path of the configuration file
    path: PathBuf,
    /// Path of portage's repos.conf
    repos_conf: PathBuf,
    /// Whether a missing file yields an empty configuration
    use_defaults: bool,
}

impl ConfigLoader {
    /// Create a new loader for the configuration file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            repos_conf: Constants::current().repos_conf_file(),
            use_defaults: true,
        }
    }

    /// Create a loader for the system configuration file
    pub fn system() -> Self {
        Self::new(Constants::current().config_file())
    }

    /// Set the repos.conf path the configuration is bound to
    pub fn repos_conf(mut self, path: impl Into<PathBuf>) -> Self {
        self.repos_conf = path.into();
        self
    }

    /// Set whether a missing file yields an empty configuration
    pub fn use_defaults(mut self, use_defaults: bool) -> Self {
        self.use_defaults = use_defaults;
        self
    }

    /// Get the configuration file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the configuration file exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the configuration
    pub fn load(&self) -> Result<Config> {
        let mut config = Config::new(&self.path, &self.repos_conf);

        if !self.exists() {
            if self.use_defaults {
                debug!(path = %self.path.display(), "configuration file missing; using defaults");
                return Ok(config);
            } else {
                return Err(ConfigError::NotFound(self.path.clone()));
            }
        }

        config.load()?;
        Ok(config)
    }
}
